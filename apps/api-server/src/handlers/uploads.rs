//! Remote image upload endpoint.

use actix_web::{HttpResponse, web};

use forum_shared::ApiResponse;
use forum_shared::dto::{RemoteImageRequest, StoredImageResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Download an image from a URL into the upload directory.
///
/// POST /api/uploads/remote
pub async fn fetch_remote(
    state: web::Data<AppState>,
    body: web::Json<RemoteImageRequest>,
) -> AppResult<HttpResponse> {
    let stored = state.images.fetch(body.url.trim()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(StoredImageResponse {
        file_name: stored.file_name,
        path: stored.path.display().to_string(),
        content_type: stored.content_type,
        size: stored.size,
    })))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use forum_core::RatingService;
    use forum_core::ports::{ImageFetchError, ImageFetcher, StoredImage};
    use forum_infra::{InMemoryBroadcaster, InMemoryRatingRepository};
    use serde_json::{Value, json};

    use super::*;
    use crate::handlers::configure_routes;

    /// Resolves by URL path so each failure mode has a fixed trigger.
    struct ScriptedFetcher;

    #[async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<StoredImage, ImageFetchError> {
            match url.rsplit('/').next().unwrap_or_default() {
                "cat.png" => Ok(StoredImage {
                    file_name: "abc.png".to_string(),
                    path: PathBuf::from("uploads/abc.png"),
                    content_type: "image/png".to_string(),
                    size: 42,
                }),
                "slow" => Err(ImageFetchError::Timeout(Duration::from_secs(10))),
                "huge" => Err(ImageFetchError::TooLarge(1024)),
                "gone" => Err(ImageFetchError::Upstream("404".to_string())),
                _ => Err(ImageFetchError::UnsupportedType("text/html".to_string())),
            }
        }
    }

    async fn post_url(url: &str) -> (StatusCode, Value) {
        let ratings = RatingService::new(
            Arc::new(InMemoryRatingRepository::new()),
            Arc::new(InMemoryBroadcaster::default()),
        );
        let state = AppState::from_parts(ratings, Arc::new(ScriptedFetcher), None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/uploads/remote")
            .set_json(json!({ "url": url }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_stored_image_is_created() {
        let (status, body) = post_url("https://img.example/cat.png").await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["fileName"], "abc.png");
        assert_eq!(body["data"]["contentType"], "image/png");
        assert_eq!(body["data"]["size"], 42);
    }

    #[actix_web::test]
    async fn test_failures_map_to_statuses() {
        let cases = [
            ("https://img.example/slow", StatusCode::GATEWAY_TIMEOUT),
            ("https://img.example/huge", StatusCode::PAYLOAD_TOO_LARGE),
            ("https://img.example/gone", StatusCode::BAD_GATEWAY),
            ("https://img.example/page", StatusCode::BAD_REQUEST),
        ];

        for (url, expected) in cases {
            let (status, body) = post_url(url).await;
            assert_eq!(status, expected, "{}", url);
            assert_eq!(body["status"], expected.as_u16());
        }
    }
}
