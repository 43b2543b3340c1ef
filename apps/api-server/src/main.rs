//! # Forum API Server
//!
//! Actix-web HTTP API for post ratings, plus a Socket.IO server pushing
//! rating updates to clients watching a post.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Condition, web};
use tracing_actix_web::TracingLogger;

use forum_core::ports::{Broadcaster, RateLimiter};
use forum_infra::InMemoryRateLimiter;

mod config;
mod handlers;
mod middleware;
mod observability;
#[cfg(feature = "websocket")]
mod realtime;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Forum API Server on {}:{}",
        config.host,
        config.port
    );

    let broadcaster = start_realtime(&config);
    let state = AppState::new(&config, broadcaster).await?;

    let rate_limit_enabled = config.rate_limit.is_some();
    let trust_proxy = config.trust_proxy;
    let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit.clone().unwrap_or_default(),
    ));
    if !rate_limit_enabled {
        tracing::warn!("Rate limiting disabled");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(
                rate_limit_enabled,
                RateLimitMiddleware::new(limiter.clone()).trust_proxy(trust_proxy),
            ))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

/// Start the Socket.IO server and return a broadcaster into its rooms.
#[cfg(feature = "websocket")]
fn start_realtime(config: &AppConfig) -> Arc<dyn Broadcaster> {
    let (layer, io) = realtime::create_socketio_layer();
    let config::RealtimeConfig { host, port } = config.realtime.clone();

    actix_rt::spawn(async move {
        if let Err(e) = realtime::serve(layer, &host, port).await {
            tracing::error!("Realtime server stopped: {}", e);
        }
    });

    Arc::new(realtime::SocketIoBroadcaster::new(io))
}

#[cfg(not(feature = "websocket"))]
fn start_realtime(_config: &AppConfig) -> Arc<dyn Broadcaster> {
    tracing::info!("Running without websocket feature - rating updates stay in-process");
    Arc::new(forum_infra::InMemoryBroadcaster::default())
}
