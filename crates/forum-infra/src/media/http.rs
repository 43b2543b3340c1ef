//! Image downloads over HTTP with reqwest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use forum_core::ports::{ImageFetchError, ImageFetcher, StoredImage};

/// Image download configuration.
#[derive(Debug, Clone)]
pub struct ImageFetchConfig {
    /// Directory receiving downloaded files.
    pub upload_dir: PathBuf,
    /// Deadline for the whole download, connect to last byte.
    pub timeout: Duration,
    /// Largest accepted body.
    pub max_bytes: u64,
}

impl Default for ImageFetchConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            timeout: Duration::from_secs(10),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ImageFetchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            timeout: std::env::var("IMAGE_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_bytes: std::env::var("IMAGE_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_bytes),
        }
    }
}

/// Streams remote images into the upload directory.
///
/// Bytes land in `<id>.part` and are renamed to `<id>.<ext>` once complete.
/// Any failure, including the deadline, removes the partial file.
pub struct HttpImageFetcher {
    client: Client,
    config: ImageFetchConfig,
}

impl HttpImageFetcher {
    pub fn new(config: ImageFetchConfig) -> Result<Self, ImageFetchError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ImageFetchError::Upstream(e.to_string()))?;

        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ImageFetchConfig, client: Client) -> Self {
        Self { client, config }
    }

    async fn download(
        &self,
        url: Url,
        file: &mut tokio::fs::File,
    ) -> Result<(String, &'static str, u64), ImageFetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageFetchError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Upstream(format!(
                "upstream responded with {}",
                status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let extension = extension_for(&content_type).ok_or_else(|| {
            ImageFetchError::UnsupportedType(if content_type.is_empty() {
                "missing".to_string()
            } else {
                content_type.clone()
            })
        })?;

        let max_bytes = self.config.max_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ImageFetchError::TooLarge(max_bytes));
        }

        let mut size = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageFetchError::Upstream(e.to_string()))?
        {
            size += chunk.len() as u64;
            if size > max_bytes {
                return Err(ImageFetchError::TooLarge(max_bytes));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| ImageFetchError::Storage(e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| ImageFetchError::Storage(e.to_string()))?;

        Ok((content_type, extension, size))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<StoredImage, ImageFetchError> {
        let url = Url::parse(url).map_err(|e| ImageFetchError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ImageFetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|e| ImageFetchError::Storage(e.to_string()))?;

        let id = Uuid::new_v4();
        let partial = self.config.upload_dir.join(format!("{}.part", id));
        let source = url.to_string();

        // Created outside the deadline so a cancelled download never races
        // a pending create on the blocking pool.
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| ImageFetchError::Storage(e.to_string()))?;

        let outcome =
            match tokio::time::timeout(self.config.timeout, self.download(url, &mut file)).await {
                Ok(result) => result,
                Err(_) => Err(ImageFetchError::Timeout(self.config.timeout)),
            };
        drop(file);

        let (content_type, extension, size) = match outcome {
            Ok(downloaded) => downloaded,
            Err(e) => {
                discard(&partial).await;
                tracing::warn!(url = %source, error = %e, "Image download failed");
                return Err(e);
            }
        };

        let file_name = format!("{}.{}", id, extension);
        let path = self.config.upload_dir.join(&file_name);
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            discard(&partial).await;
            return Err(ImageFetchError::Storage(e.to_string()));
        }

        tracing::info!(url = %source, file = %file_name, size, "Image downloaded");

        Ok(StoredImage {
            file_name,
            path,
            content_type,
            size,
        })
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

async fn discard(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => tracing::debug!(path = %partial.display(), "Partial download removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %partial.display(), error = %e, "Failed to remove partial download")
        }
    }
}
