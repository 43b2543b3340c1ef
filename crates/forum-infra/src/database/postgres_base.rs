use std::marker::PhantomData;

use sea_orm::sqlx::error::ErrorKind;
use sea_orm::{DbConn, DbErr, EntityTrait, RuntimeErr, SqlErr};

use forum_core::error::RepoError;

/// Shared state of the PostgreSQL repositories.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Classify a driver error by its SQLSTATE class rather than by message text.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    if let DbErr::Exec(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(e)))
    | DbErr::Query(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(e))) = &err
    {
        match e.kind() {
            ErrorKind::UniqueViolation => return RepoError::Duplicate(e.message().to_string()),
            ErrorKind::ForeignKeyViolation => {
                return RepoError::Constraint(e.message().to_string());
            }
            _ => {}
        }
    }

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::Duplicate(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => RepoError::Constraint(msg),
        _ => match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(err.to_string()),
            other => RepoError::Query(other.to_string()),
        },
    }
}
