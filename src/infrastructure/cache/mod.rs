//! Redis cache client.
//!
//! [`Cache::connect`] opens a connection, verifies it with a PING and exposes
//! [`Cache::set_struct`] / [`Cache::get_struct`] for storing serde types as
//! MessagePack. A missing key is reported as [`CacheError::NotFound`], never
//! as a decode failure or a default value.

mod codec;
mod error;
mod redis_cache;

pub use codec::{decode, encode};
pub use error::{CacheError, CacheResult};
pub use redis_cache::{Cache, connection_url};
