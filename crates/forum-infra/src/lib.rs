//! # Forum Infrastructure
//!
//! Concrete implementations of the ports defined in `forum-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL rating storage via SeaORM
//! - `rate-limit` - Rate limiting via governor
//! - `http-fetch` - Remote image downloads via reqwest

pub mod broadcast;
pub mod database;

#[cfg(feature = "http-fetch")]
pub mod media;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use broadcast::InMemoryBroadcaster;
pub use database::{DatabaseConfig, DatabaseConnections, InMemoryRatingRepository};

#[cfg(feature = "postgres")]
pub use database::PostgresRatingRepository;

#[cfg(feature = "http-fetch")]
pub use media::{HttpImageFetcher, ImageFetchConfig};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
