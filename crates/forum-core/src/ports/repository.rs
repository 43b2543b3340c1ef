use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Rating, RatingAggregate, RatingWithRater, Score};
use crate::error::RepoError;

/// Rating storage keyed by the `(post_id, user_id)` pair.
///
/// Implementations must reject a second rating for the same pair with
/// [`RepoError::Duplicate`]; the service relies on that to detect races.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Find the rating a user gave a post.
    async fn find(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Rating>, RepoError>;

    /// Insert a new rating.
    async fn insert(&self, rating: Rating) -> Result<Rating, RepoError>;

    /// Overwrite the score of an existing rating. `None` if the pair has no rating.
    async fn update_score(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        score: Score,
    ) -> Result<Option<Rating>, RepoError>;

    /// Delete the rating of a pair. Fails with [`RepoError::NotFound`] if absent.
    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError>;

    /// All ratings of a post, newest first, with raters resolved.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<RatingWithRater>, RepoError>;

    /// Mean and count of a post's ratings.
    async fn aggregate(&self, post_id: Uuid) -> Result<RatingAggregate, RepoError>;
}
