use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::Logger;
use crate::infrastructure::persistence::Database;

/// Handles constructed once at startup and shared with every component.
///
/// All fields are cheap to clone and share their underlying resources.
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub db: Database,
    pub cache: Cache,
}

impl AppState {
    pub fn new(logger: Logger, db: Database, cache: Cache) -> Self {
        Self { logger, db, cache }
    }
}
