use thiserror::Error;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("chapter does not belong to this course")]
    InvalidChapter,
    #[error("resource conflicts with an existing one")]
    Conflict,
    #[error("invalid input: {0}")]
    Validation(String),
}

impl DatabaseError {
    /// Turns unique constraint violations into [`DatabaseError::Conflict`].
    pub fn from_write(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict,
            _ => Self::SqlxError(e),
        }
    }
}
