//! # Service Tools
//!
//! Startup helpers that turn configuration into ready-to-use client handles.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Logger, database and cache settings from env or JSON
//! - **Infrastructure Layer** ([`infrastructure`]) - One module per wrapped client
//! - **Bootstrap** ([`bootstrap`]) - Ordered startup returning an [`AppState`]
//!
//! ## Features
//!
//! - Daily rotated log files with a link to the current file and one week retention
//! - JSON or text log lines with configurable level rendering and timestamp prefix
//! - MySQL pool with table naming conventions and statement logging
//! - Redis client storing serde types as MessagePack, with a distinct not-found error
//!
//! Handles are returned to the caller rather than stored in globals; share them
//! by cloning [`AppState`].
//!
//! ## Quick Start
//!
//! ```bash
//! export DB_USER="root" DB_PASSWORD="secret" DB_NAME="app"
//! export REDIS_ADDR="127.0.0.1:6379"
//!
//! cargo run -- check
//! ```
//!
//! ## Configuration
//!
//! See [`config::Config`] for the available variables and the JSON layout.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod state;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::config::{CacheConfig, Config, DbConfig, LoggerConfig};
    pub use crate::error::AppError;
    pub use crate::infrastructure::cache::{Cache, CacheError};
    pub use crate::infrastructure::logging::{LevelStyle, LogFormat, LogLevel, Logger};
    pub use crate::infrastructure::persistence::{Database, DbError, TableNaming};
    pub use crate::state::AppState;
}
