//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub database: &'static str,
}

/// Health check endpoint - returns server and database status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match &state.db {
        Some(db) if db.ping().await => "connected",
        Some(_) => "unreachable",
        None => "disabled",
    };

    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use forum_core::RatingService;
    use forum_infra::{
        HttpImageFetcher, ImageFetchConfig, InMemoryBroadcaster, InMemoryRatingRepository,
    };
    use serde_json::Value;

    use super::*;

    #[actix_web::test]
    async fn test_health_without_database() {
        let ratings = RatingService::new(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(InMemoryBroadcaster::default()),
        );
        let images = HttpImageFetcher::new(ImageFetchConfig::default()).unwrap();
        let state = AppState::from_parts(ratings, Arc::new(images), None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/api/health", web::get().to(health_check)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "disabled");
    }
}
