//! Rating endpoints.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use forum_core::domain::{Rating, RatingWithRater, Submission};
use forum_shared::ApiResponse;
use forum_shared::dto::{
    ListedRatingResponse, PostRatingsResponse, RaterResponse, RatingResponse,
    RatingSummaryResponse, SubmitRatingRequest, UpdateRatingRequest,
};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Submit a rating, replacing the user's earlier one for the same post.
///
/// POST /api/ratings
pub async fn submit(
    state: web::Data<AppState>,
    body: web::Json<SubmitRatingRequest>,
) -> AppResult<HttpResponse> {
    let post_id = parse_id(&body.post_id, "postId")?;
    let user_id = parse_id(&body.user_id, "userId")?;

    let submission = state.ratings.submit(post_id, user_id, body.rating).await?;

    let response = match submission {
        Submission::Created(rating) => HttpResponse::Created().json(ApiResponse::ok_with_message(
            rating_response(&rating),
            "Rating submitted",
        )),
        Submission::Updated(rating) => HttpResponse::Ok().json(ApiResponse::ok_with_message(
            rating_response(&rating),
            "Rating updated",
        )),
    };

    Ok(response)
}

/// List a post's ratings, newest first, with the aggregate.
///
/// GET /api/ratings/post/{postId}
pub async fn list_for_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_id(&path, "postId")?;

    let listed = state.ratings.list_for_post(post_id).await?;

    Ok(HttpResponse::Ok().json(PostRatingsResponse {
        ratings: listed.ratings.iter().map(listed_response).collect(),
        average_rating: listed.aggregate.average_rating,
        total_ratings: listed.aggregate.count,
    }))
}

/// GET /api/ratings/post/{postId}/summary
pub async fn summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_id(&path, "postId")?;

    let aggregate = state.ratings.aggregate(post_id).await;

    Ok(HttpResponse::Ok().json(RatingSummaryResponse {
        post_id,
        average_rating: aggregate.average_rating,
        count: aggregate.count,
    }))
}

/// Change the score of an existing rating.
///
/// PUT /api/ratings/post/{postId}/user/{userId}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateRatingRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, user_id) = parse_pair(&path)?;

    let rating = state.ratings.update(post_id, user_id, body.rating).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        rating_response(&rating),
        "Rating updated",
    )))
}

/// Remove a rating. Responds with the post's new aggregate.
///
/// DELETE /api/ratings/post/{postId}/user/{userId}
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (post_id, user_id) = parse_pair(&path)?;

    let aggregate = state.ratings.delete(post_id, user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        RatingSummaryResponse {
            post_id,
            average_rating: aggregate.average_rating,
            count: aggregate.count,
        },
        "Rating deleted",
    )))
}

fn parse_id(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{} is not a valid id: '{}'", field, raw)))
}

fn parse_pair(path: &(String, String)) -> AppResult<(Uuid, Uuid)> {
    Ok((parse_id(&path.0, "postId")?, parse_id(&path.1, "userId")?))
}

fn rating_response(rating: &Rating) -> RatingResponse {
    RatingResponse {
        id: rating.id,
        post_id: rating.post_id,
        user_id: rating.user_id,
        rating: rating.score.get(),
        created_at: rating.created_at,
        updated_at: rating.updated_at,
    }
}

fn listed_response(listed: &RatingWithRater) -> ListedRatingResponse {
    ListedRatingResponse {
        rating: rating_response(&listed.rating),
        user: listed.rater.as_ref().map(|rater| RaterResponse {
            id: rater.id,
            username: rater.username.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use forum_core::RatingService;
    use forum_core::domain::User;
    use forum_core::ports::{ImageFetchError, ImageFetcher, StoredImage};
    use forum_infra::{InMemoryBroadcaster, InMemoryRatingRepository};
    use serde_json::{Value, json};

    use super::*;
    use crate::handlers::configure_routes;

    struct NoImages;

    #[async_trait]
    impl ImageFetcher for NoImages {
        async fn fetch(&self, url: &str) -> Result<StoredImage, ImageFetchError> {
            Err(ImageFetchError::InvalidUrl(url.to_string()))
        }
    }

    fn state_with(repo: Arc<InMemoryRatingRepository>) -> AppState {
        let service = RatingService::new(repo, Arc::new(InMemoryBroadcaster::default()));
        AppState::from_parts(service, Arc::new(NoImages), None)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_submit_then_resubmit() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));
        let (post, user) = (Uuid::new_v4(), Uuid::new_v4());

        let req = test::TestRequest::post()
            .uri("/api/ratings/")
            .set_json(json!({ "postId": post, "userId": user, "rating": 4 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["rating"], 4);
        assert_eq!(body["data"]["postId"], post.to_string());

        let req = test::TestRequest::post()
            .uri("/api/ratings")
            .set_json(json!({ "postId": post, "userId": user, "rating": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/ratings/post/{}/summary", post))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["averageRating"], 2.0);
        assert_eq!(body["count"], 1);
    }

    #[actix_web::test]
    async fn test_submit_rejects_out_of_range_and_bad_ids() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));

        for body in [
            json!({ "postId": Uuid::new_v4(), "userId": Uuid::new_v4(), "rating": 0 }),
            json!({ "postId": Uuid::new_v4(), "userId": Uuid::new_v4(), "rating": 6 }),
            json!({ "postId": "not-an-id", "userId": Uuid::new_v4(), "rating": 3 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/ratings/")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn test_malformed_body_is_problem_json() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));

        let req = test::TestRequest::post()
            .uri("/api/ratings/")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"postId\":")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
    }

    #[actix_web::test]
    async fn test_list_includes_rater_and_aggregate() {
        let repo = Arc::new(InMemoryRatingRepository::new());
        let dave = User::new("dave".to_string(), "dave@uni.example".to_string());
        repo.add_user(dave.clone()).await;
        let app = app!(state_with(repo));
        let post = Uuid::new_v4();

        for (user, rating) in [(dave.id, 5), (Uuid::new_v4(), 2)] {
            let req = test::TestRequest::post()
                .uri("/api/ratings/")
                .set_json(json!({ "postId": post, "userId": user, "rating": rating }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/ratings/post/{}", post))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["totalRatings"], 2);
        assert_eq!(body["averageRating"], 3.5);
        let ratings = body["ratings"].as_array().unwrap();
        let by_dave = ratings
            .iter()
            .find(|r| r["userId"] == dave.id.to_string())
            .unwrap();
        assert_eq!(by_dave["user"]["username"], "dave");
        let unseeded = ratings
            .iter()
            .find(|r| r["userId"] != dave.id.to_string())
            .unwrap();
        assert!(unseeded["user"].is_null());
    }

    #[actix_web::test]
    async fn test_update_and_delete_missing_rating_are_not_found() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));
        let uri = format!("/api/ratings/post/{}/user/{}", Uuid::new_v4(), Uuid::new_v4());

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "rating": 3 }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn test_update_rejects_out_of_range_score() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));
        let (post, user) = (Uuid::new_v4(), Uuid::new_v4());

        let req = test::TestRequest::post()
            .uri("/api/ratings/")
            .set_json(json!({ "postId": post, "userId": user, "rating": 3 }))
            .to_request();
        test::call_service(&app, req).await;

        let uri = format!("/api/ratings/post/{}/user/{}", post, user);
        for rating in [0, 6] {
            let req = test::TestRequest::put()
                .uri(&uri)
                .set_json(json!({ "rating": rating }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], 400);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/ratings/post/{}/summary", post))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["averageRating"], 3.0);
    }

    #[actix_web::test]
    async fn test_malformed_path_ids_are_bad_request() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));
        let valid = Uuid::new_v4();

        for uri in [
            "/api/ratings/post/not-a-uuid".to_string(),
            "/api/ratings/post/not-a-uuid/summary".to_string(),
        ] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "GET {}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["detail"].as_str().unwrap().contains("postId"));
        }

        for (uri, field) in [
            (format!("/api/ratings/post/bad/user/{}", valid), "postId"),
            (format!("/api/ratings/post/{}/user/bad", valid), "userId"),
        ] {
            let req = test::TestRequest::delete().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "DELETE {}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["detail"].as_str().unwrap().contains(field));
        }
    }

    #[actix_web::test]
    async fn test_delete_returns_new_aggregate() {
        let app = app!(state_with(Arc::new(InMemoryRatingRepository::new())));
        let (post, alice, bob) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        for (user, rating) in [(alice, 1), (bob, 4)] {
            let req = test::TestRequest::post()
                .uri("/api/ratings/")
                .set_json(json!({ "postId": post, "userId": user, "rating": rating }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::delete()
            .uri(&format!("/api/ratings/post/{}/user/{}", post, alice))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["averageRating"], 4.0);
        assert_eq!(body["data"]["count"], 1);
    }
}
