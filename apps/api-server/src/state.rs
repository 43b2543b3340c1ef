//! Application state - shared across all handlers.

use std::sync::Arc;

use forum_core::RatingService;
use forum_core::ports::{Broadcaster, ImageFetcher, RatingRepository};
use forum_infra::{DatabaseConnections, HttpImageFetcher, InMemoryRatingRepository};

#[cfg(feature = "postgres")]
use forum_infra::PostgresRatingRepository;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ratings: Arc<RatingService>,
    pub images: Arc<dyn ImageFetcher>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(
        config: &AppConfig,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> std::io::Result<Self> {
        let (db, repo) = Self::init_repository(config).await;

        let images = HttpImageFetcher::new(config.images.clone())
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        tracing::info!(
            upload_dir = %config.images.upload_dir.display(),
            "Application state initialized"
        );

        Ok(Self::from_parts(
            RatingService::new(repo, broadcaster),
            Arc::new(images),
            db,
        ))
    }

    pub fn from_parts(
        ratings: RatingService,
        images: Arc<dyn ImageFetcher>,
        db: Option<Arc<DatabaseConnections>>,
    ) -> Self {
        Self {
            ratings: Arc::new(ratings),
            images,
            db,
        }
    }

    #[cfg(feature = "postgres")]
    async fn init_repository(
        config: &AppConfig,
    ) -> (Option<Arc<DatabaseConnections>>, Arc<dyn RatingRepository>) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!(
                "DATABASE_URL not set. Running without database (in-memory mode, raters unresolved)."
            );
            return (None, Arc::new(InMemoryRatingRepository::new()));
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                let repo = Arc::new(PostgresRatingRepository::new(conn.main.clone()));
                (Some(conn), repo)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                (None, Arc::new(InMemoryRatingRepository::new()))
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn init_repository(
        _config: &AppConfig,
    ) -> (Option<Arc<DatabaseConnections>>, Arc<dyn RatingRepository>) {
        tracing::info!("Running without postgres feature - using in-memory repository");
        (None, Arc::new(InMemoryRatingRepository::new()))
    }
}
