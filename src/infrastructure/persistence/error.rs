use thiserror::Error;

/// Errors from opening or using the database handle.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid database settings: {0}")]
    InvalidSettings(String),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;
