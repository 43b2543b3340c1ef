//! Rating entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use forum_core::domain::Score;
use forum_core::error::RepoError;

/// `(post_id, user_id)` is unique through `idx_ratings_post_user`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ratings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Rating.
impl TryFrom<Model> for forum_core::domain::Rating {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let score = Score::new(i64::from(model.score))
            .map_err(|e| RepoError::Query(format!("corrupt rating {}: {}", model.id, e)))?;

        Ok(Self {
            id: model.id,
            post_id: model.post_id,
            user_id: model.user_id,
            score,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Conversion from Domain Rating to SeaORM ActiveModel.
impl From<forum_core::domain::Rating> for ActiveModel {
    fn from(rating: forum_core::domain::Rating) -> Self {
        Self {
            id: Set(rating.id),
            post_id: Set(rating.post_id),
            user_id: Set(rating.user_id),
            score: Set(i32::from(rating.score.get())),
            created_at: Set(rating.created_at.into()),
            updated_at: Set(rating.updated_at.into()),
        }
    }
}
