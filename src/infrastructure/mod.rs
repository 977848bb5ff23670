//! Infrastructure layer for external integrations.
//!
//! Each module wraps one third-party client and turns its configuration
//! section into a ready-to-use handle.
//!
//! # Modules
//!
//! - [`logging`] - Rotating structured logger on top of `tracing`
//! - [`persistence`] - MySQL connection pool via SQLx
//! - [`cache`] - Redis client with MessagePack struct helpers

pub mod cache;
pub mod logging;
pub mod persistence;
