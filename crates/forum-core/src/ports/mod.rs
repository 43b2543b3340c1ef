//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod broadcast;
mod image;
mod rate_limit;
mod repository;

pub use broadcast::{BroadcastError, Broadcaster};
pub use image::{ImageFetchError, ImageFetcher, StoredImage};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::RatingRepository;
