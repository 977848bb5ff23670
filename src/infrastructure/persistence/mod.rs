//! Relational database access through SQLx.
//!
//! [`Database::connect`] turns a [`DbConfig`](crate::config::DbConfig) into a
//! pooled MySQL handle. Table names for Rust types follow a
//! [`NamingStrategy`] built from the configured prefix and [`TableNaming`].

mod database;
mod error;
mod naming;

pub use database::{Database, QueryLogLevel, SLOW_QUERY_THRESHOLD, connection_url, pool_options};
pub use error::{DbError, DbResult};
pub use naming::{NamingStrategy, TableNaming};
