//! Application configuration loaded from environment variables.

use std::env;

use forum_infra::{DatabaseConfig, ImageFetchConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub realtime: RealtimeConfig,
    pub database: Option<DatabaseConfig>,
    pub rate_limit: Option<RateLimitConfig>,
    /// Key rate limits on forwarding headers instead of the socket peer.
    pub trust_proxy: bool,
    pub images: ImageFetchConfig,
}

/// Bind address of the Socket.IO server.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let realtime = RealtimeConfig {
            host: env::var("REALTIME_HOST").unwrap_or_else(|_| host.clone()),
            port: parse_var("REALTIME_PORT").unwrap_or(8081),
        };

        let rate_limit = env::var("RATE_LIMIT_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true)
            .then(RateLimitConfig::from_env);

        Self {
            host,
            port: parse_var("PORT").unwrap_or(8080),
            realtime,
            database: DatabaseConfig::from_env(),
            rate_limit,
            trust_proxy: parse_var("RATE_LIMIT_TRUST_PROXY").unwrap_or(false),
            images: ImageFetchConfig::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
