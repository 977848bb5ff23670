//! Crate-level error type.

use thiserror::Error;

use crate::infrastructure::cache::CacheError;
use crate::infrastructure::persistence::DbError;

/// Failure while bringing up the application handles.
///
/// The logger never fails, so only the database and cache appear here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AppError {
    /// Name of the component that failed, for reporting.
    pub fn component(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Cache(_) => "cache",
        }
    }
}
