//! In-memory rating repository - used when no database is configured.
//!
//! Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use forum_core::domain::{Rater, Rating, RatingAggregate, RatingWithRater, Score, User};
use forum_core::error::RepoError;
use forum_core::ports::RatingRepository;

/// Ratings keyed by `(post_id, user_id)`, mirroring the unique index of the
/// SQL schema.
pub struct InMemoryRatingRepository {
    ratings: RwLock<HashMap<(Uuid, Uuid), Rating>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryRatingRepository {
    pub fn new() -> Self {
        Self {
            ratings: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register a user so listings can resolve the rater.
    ///
    /// In-memory mode has no user registry or signup path, so nothing calls
    /// this at runtime and listed raters are `null` unless a caller seeds
    /// them here.
    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

impl Default for InMemoryRatingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RatingRepository for InMemoryRatingRepository {
    async fn find(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Rating>, RepoError> {
        Ok(self.ratings.read().await.get(&(post_id, user_id)).cloned())
    }

    async fn insert(&self, rating: Rating) -> Result<Rating, RepoError> {
        let mut ratings = self.ratings.write().await;
        let key = (rating.post_id, rating.user_id);

        if ratings.contains_key(&key) {
            return Err(RepoError::Duplicate(format!(
                "rating for post {} by user {} already exists",
                rating.post_id, rating.user_id
            )));
        }

        ratings.insert(key, rating.clone());
        Ok(rating)
    }

    async fn update_score(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        score: Score,
    ) -> Result<Option<Rating>, RepoError> {
        let mut ratings = self.ratings.write().await;

        Ok(ratings.get_mut(&(post_id, user_id)).map(|rating| {
            rating.rescore(score);
            rating.clone()
        }))
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        self.ratings
            .write()
            .await
            .remove(&(post_id, user_id))
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<RatingWithRater>, RepoError> {
        let ratings = self.ratings.read().await;
        let users = self.users.read().await;

        let mut listed: Vec<RatingWithRater> = ratings
            .values()
            .filter(|r| r.post_id == post_id)
            .map(|r| RatingWithRater {
                rating: r.clone(),
                rater: users.get(&r.user_id).map(Rater::from),
            })
            .collect();
        listed.sort_by(|a, b| b.rating.created_at.cmp(&a.rating.created_at));

        Ok(listed)
    }

    async fn aggregate(&self, post_id: Uuid) -> Result<RatingAggregate, RepoError> {
        let ratings = self.ratings.read().await;

        Ok(RatingAggregate::from_scores(
            ratings
                .values()
                .filter(|r| r.post_id == post_id)
                .map(|r| r.score),
        ))
    }
}
