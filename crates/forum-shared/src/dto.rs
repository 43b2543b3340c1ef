//! Data Transfer Objects - request/response types for the API.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/ratings`.
///
/// Ids stay strings here so malformed ones surface as a validation error
/// naming the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub post_id: String,
    pub user_id: String,
    pub rating: i64,
}

/// Body of `PUT /api/ratings/post/{postId}/user/{userId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: i64,
}

/// A stored rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public identity of a rater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaterResponse {
    pub id: Uuid,
    pub username: String,
}

/// A rating as listed under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedRatingResponse {
    #[serde(flatten)]
    pub rating: RatingResponse,
    pub user: Option<RaterResponse>,
}

/// Body of `GET /api/ratings/post/{postId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRatingsResponse {
    pub ratings: Vec<ListedRatingResponse>,
    pub average_rating: f64,
    pub total_ratings: u64,
}

/// A post's aggregate rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummaryResponse {
    pub post_id: Uuid,
    pub average_rating: f64,
    pub count: u64,
}

/// Body of `POST /api/uploads/remote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteImageRequest {
    pub url: String,
}

/// A downloaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImageResponse {
    pub file_name: String,
    pub path: String,
    pub content_type: String,
    pub size: u64,
}
