//! Broadcast port - pushes events to realtime subscribers of a room.

use async_trait::async_trait;

/// Delivers events to every client subscribed to a room.
///
/// Delivery is best-effort. Callers send full state, never deltas, so a
/// missed event is corrected by the next one.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Emit `event` with `payload` to all subscribers of `room`.
    async fn emit(
        &self,
        room: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError>;
}

/// Broadcast errors.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("Failed to emit: {0}")]
    Emit(String),

    #[error("Failed to encode payload: {0}")]
    Encode(String),
}
