//! Startup sequence.
//!
//! Brings up the logger first so the database and cache connections are
//! logged through it, then opens the database pool and the cache client.

use crate::config::{Config, LoggerConfig};
use crate::error::AppError;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::Logger;
use crate::infrastructure::persistence::Database;
use crate::state::AppState;

/// Builds the logger and makes it the process-wide default subscriber.
///
/// If a global subscriber is already installed the new logger is still
/// returned and can be used through [`Logger::in_scope`].
pub fn install_logger(config: &LoggerConfig) -> Logger {
    let logger = Logger::init(config);

    if let Err(e) = logger.install_global() {
        tracing::warn!("Logger not installed globally: {}", e);
    }
    if logger.is_degraded() {
        tracing::warn!(
            "Log directory {} unavailable, file output disabled",
            config.dir.display()
        );
    }

    logger
}

/// Initializes every handle in order: logger, database, cache.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Cache connection or PING fails
pub async fn init(config: &Config) -> Result<AppState, AppError> {
    let logger = install_logger(&config.logger);
    tracing::info!("Logger initialized (dir: {})", config.logger.dir.display());

    let db = Database::connect(&config.database).await?;

    let (cache, pong) = Cache::connect(&config.cache).await?;
    tracing::info!("Cache replied to PING with {}", pong);

    Ok(AppState::new(logger, db, cache))
}
