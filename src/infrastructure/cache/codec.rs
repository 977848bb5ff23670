//! MessagePack encoding for cached values.
//!
//! Structs are written as maps keyed by field name, so adding an optional
//! field to a cached type does not invalidate entries written before.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::CacheResult;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CacheResult<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}
