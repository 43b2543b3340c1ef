//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use uuid::Uuid;

use forum_core::domain::{Rating, RatingAggregate, RatingWithRater, Score};
use forum_core::error::RepoError;
use forum_core::ports::RatingRepository;

use super::entity::rating::{self, Entity as RatingEntity};
use super::entity::user::Entity as UserEntity;
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL rating repository.
pub type PostgresRatingRepository = PostgresBaseRepository<RatingEntity>;

#[derive(Debug, FromQueryResult)]
struct AggregateRow {
    total: Option<i64>,
    count: i64,
}

impl PostgresRatingRepository {
    async fn find_model(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<rating::Model>, RepoError> {
        RatingEntity::find()
            .filter(rating::Column::PostId.eq(post_id))
            .filter(rating::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingRepository {
    async fn find(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Rating>, RepoError> {
        self.find_model(post_id, user_id)
            .await?
            .map(Rating::try_from)
            .transpose()
    }

    async fn insert(&self, rating: Rating) -> Result<Rating, RepoError> {
        let active_model: rating::ActiveModel = rating.into();
        let model = active_model.insert(&self.db).await.map_err(map_db_err)?;

        tracing::debug!(rating_id = %model.id, post_id = %model.post_id, "Rating inserted");
        Rating::try_from(model)
    }

    async fn update_score(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        score: Score,
    ) -> Result<Option<Rating>, RepoError> {
        let Some(model) = self.find_model(post_id, user_id).await? else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        active_model.score = Set(i32::from(score.get()));
        active_model.updated_at = Set(Utc::now().into());

        let model = active_model.update(&self.db).await.map_err(map_db_err)?;
        Rating::try_from(model).map(Some)
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<(), RepoError> {
        let result = RatingEntity::delete_many()
            .filter(rating::Column::PostId.eq(post_id))
            .filter(rating::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<RatingWithRater>, RepoError> {
        let rows = RatingEntity::find()
            .filter(rating::Column::PostId.eq(post_id))
            .order_by_desc(rating::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        rows.into_iter()
            .map(|(model, user)| {
                Ok(RatingWithRater {
                    rating: Rating::try_from(model)?,
                    rater: user.map(Into::into),
                })
            })
            .collect()
    }

    async fn aggregate(&self, post_id: Uuid) -> Result<RatingAggregate, RepoError> {
        let row = RatingEntity::find()
            .select_only()
            .column_as(Expr::col(rating::Column::Score).sum(), "total")
            .column_as(Expr::col(rating::Column::Id).count(), "count")
            .filter(rating::Column::PostId.eq(post_id))
            .into_model::<AggregateRow>()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(row
            .map(|r| RatingAggregate::from_totals(r.total.unwrap_or(0), r.count.max(0) as u64))
            .unwrap_or_default())
    }
}
