//! HTTP handlers and route configuration.

mod health;
mod ratings;
mod uploads;

use actix_web::{HttpResponse, error::InternalError, web};
use forum_shared::ErrorResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Ratings
            .service(
                web::scope("/ratings")
                    .route("", web::post().to(ratings::submit))
                    .route("/", web::post().to(ratings::submit))
                    .route("/post/{post_id}", web::get().to(ratings::list_for_post))
                    .route("/post/{post_id}/summary", web::get().to(ratings::summary))
                    .route(
                        "/post/{post_id}/user/{user_id}",
                        web::put().to(ratings::update),
                    )
                    .route(
                        "/post/{post_id}/user/{user_id}",
                        web::delete().to(ratings::delete),
                    ),
            )
            // Uploads
            .route("/uploads/remote", web::post().to(uploads::fetch_remote)),
    );
}

/// Render JSON extraction failures as problem details.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(detail)),
        )
        .into()
    })
}
