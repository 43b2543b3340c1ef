//! Remote image download port.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

/// An image persisted in the upload directory.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
}

/// Downloads a remote image into local storage.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<StoredImage, ImageFetchError>;
}

/// Image download errors. No partial file survives any of them.
#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Download timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Image exceeds {0} bytes")]
    TooLarge(u64),

    #[error("Storage error: {0}")]
    Storage(String),
}
