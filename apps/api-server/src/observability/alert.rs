//! Critical error alerting layer for tracing.
//!
//! ERROR events (failed aggregations, internal handler errors, limiter
//! outages) are forwarded to an [`AlertSender`] on a background task.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing error details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub service: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    fn summary(&self) -> String {
        let mut text = format!("[{}] {} ({})", self.service, self.message, self.target);
        for (name, value) in &self.fields {
            text.push_str(&format!(" {}={}", name, value));
        }
        text
    }
}

/// Destination for alerts.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr (development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("ALERT {} at {}", alert.summary(), alert.timestamp);
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack or Discord compatible `text` body).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({
            "text": format!("*Forum API error*\n{}\n{}", alert.summary(), alert.timestamp)
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Tracing layer that sends alerts on ERROR-level events.
pub struct AlertLayer {
    service: String,
    sender: mpsc::Sender<AlertMessage>,
}

impl AlertLayer {
    /// Spawns the delivery task; must be called inside a Tokio runtime.
    pub fn new(service: impl Into<String>, alert_sender: Arc<dyn AlertSender>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(100);

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    // Not through tracing, or the failure would alert again.
                    eprintln!("{}", e);
                }
            }
        });

        Self {
            service: service.into(),
            sender: tx,
        }
    }

    pub fn console(service: impl Into<String>) -> Self {
        Self::new(service, Arc::new(ConsoleAlertSender))
    }

    pub fn webhook(service: impl Into<String>, url: String) -> Self {
        Self::new(service, Arc::new(WebhookAlertSender::new(url)))
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != tracing::Level::ERROR {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            service: self.service.clone(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Dropped when the queue is full
        let _ = self.sender.try_send(alert);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[derive(Default)]
    struct CollectingSender {
        alerts: Mutex<Vec<AlertMessage>>,
    }

    #[async_trait::async_trait]
    impl AlertSender for CollectingSender {
        async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
            self.alerts.lock().await.push(alert);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_only_errors_are_forwarded() {
        let sender = Arc::new(CollectingSender::default());
        let subscriber =
            tracing_subscriber::registry().with(AlertLayer::new("forum-api", sender.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Broadcast failed");
            tracing::error!(post_id = "p1", "Aggregation failed");
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        let alerts = sender.alerts.lock().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "Aggregation failed");
        assert_eq!(alerts[0].service, "forum-api");
        assert!(alerts[0].summary().contains("post_id=p1"));
    }
}
