//! Rating service - upsert, read, update and delete with realtime fan-out.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    PostRatings, RATING_UPDATED_EVENT, Rating, RatingAggregate, RatingUpdated, Score, Submission,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{BroadcastError, Broadcaster, RatingRepository};

/// Business logic for post ratings.
///
/// Every successful mutation is followed by a `ratingUpdated` broadcast of
/// the post's full aggregate to the room named after the post id.
pub struct RatingService {
    repo: Arc<dyn RatingRepository>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl RatingService {
    pub fn new(repo: Arc<dyn RatingRepository>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { repo, broadcaster }
    }

    /// Current aggregate of a post.
    ///
    /// Never fails: a repository error is logged and yields `{0, 0}`.
    pub async fn aggregate(&self, post_id: Uuid) -> RatingAggregate {
        match self.repo.aggregate(post_id).await {
            Ok(aggregate) => aggregate,
            Err(e) => {
                tracing::error!(post_id = %post_id, error = %e, "Rating aggregation failed");
                RatingAggregate::default()
            }
        }
    }

    /// Create or overwrite the rating a user gives a post.
    pub async fn submit(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        value: i64,
    ) -> Result<Submission, DomainError> {
        let score = Score::new(value)?;

        let submission = match self.repo.find(post_id, user_id).await? {
            Some(_) => match self.repo.update_score(post_id, user_id, score).await? {
                Some(updated) => Submission::Updated(updated),
                // Deleted between the lookup and the write.
                None => self.insert(post_id, user_id, score).await?,
            },
            None => self.insert(post_id, user_id, score).await?,
        };

        tracing::debug!(
            post_id = %post_id,
            user_id = %user_id,
            score = %score,
            created = matches!(submission, Submission::Created(_)),
            "Rating stored"
        );

        self.publish_aggregate(post_id).await;
        Ok(submission)
    }

    async fn insert(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        score: Score,
    ) -> Result<Submission, DomainError> {
        match self.repo.insert(Rating::new(post_id, user_id, score)).await {
            Ok(created) => Ok(Submission::Created(created)),
            Err(RepoError::Duplicate(_)) => {
                tracing::info!(
                    post_id = %post_id,
                    user_id = %user_id,
                    "Concurrent rating submission lost the insert race"
                );
                Err(DomainError::Duplicate(
                    "a rating for this post and user already exists; update it instead"
                        .to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All ratings of a post, newest first, with the aggregate of that snapshot.
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<PostRatings, DomainError> {
        let ratings = self.repo.list_for_post(post_id).await?;
        let aggregate = RatingAggregate::from_scores(ratings.iter().map(|r| r.rating.score));
        Ok(PostRatings { ratings, aggregate })
    }

    /// Overwrite an existing rating.
    pub async fn update(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        value: i64,
    ) -> Result<Rating, DomainError> {
        let score = Score::new(value)?;

        let rating = self
            .repo
            .update_score(post_id, user_id, score)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Rating for post",
                id: post_id,
            })?;

        self.publish_aggregate(post_id).await;
        Ok(rating)
    }

    /// Remove a rating and return the post's new aggregate.
    pub async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<RatingAggregate, DomainError> {
        match self.repo.delete(post_id, user_id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => {
                return Err(DomainError::NotFound {
                    entity_type: "Rating for post",
                    id: post_id,
                });
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.publish_aggregate(post_id).await)
    }

    async fn publish_aggregate(&self, post_id: Uuid) -> RatingAggregate {
        let aggregate = self.aggregate(post_id).await;
        let room = post_id.to_string();

        let result = serde_json::to_value(RatingUpdated::new(post_id, aggregate))
            .map_err(|e| BroadcastError::Encode(e.to_string()));
        let result = match result {
            Ok(payload) => {
                self.broadcaster
                    .emit(&room, RATING_UPDATED_EVENT, payload)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(post_id = %post_id, error = %e, "Failed to broadcast rating update");
        }

        aggregate
    }
}
