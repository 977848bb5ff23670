//! Redis-backed cache handle.

use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::codec;
use super::error::{CacheError, CacheResult};
use crate::config::{CacheConfig, mask_connection_string};

/// Builds `redis://[:password@]addr/db` from the cache settings.
///
/// # Errors
///
/// Returns [`CacheError::InvalidSettings`] if `addr` cannot form a URL.
pub fn connection_url(config: &CacheConfig) -> CacheResult<Url> {
    let mut url = Url::parse(&format!("redis://{}/{}", config.addr, config.db))
        .map_err(|e| CacheError::InvalidSettings(format!("address '{}': {}", config.addr, e)))?;

    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|()| CacheError::InvalidSettings("password cannot be set".to_string()))?;
    }

    Ok(url)
}

/// How an expiration is sent to Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    /// `SET`, no expiry.
    Persist,
    /// `SETEX` with whole seconds.
    Seconds(u64),
    /// `PSETEX`, at least one millisecond.
    Millis(u64),
}

impl Expiry {
    fn from_duration(expiration: Duration) -> Self {
        if expiration.is_zero() {
            Self::Persist
        } else if expiration < Duration::from_secs(1) || expiration.subsec_nanos() != 0 {
            let millis = u64::try_from(expiration.as_millis()).unwrap_or(u64::MAX);
            Self::Millis(millis.max(1))
        } else {
            Self::Seconds(expiration.as_secs())
        }
    }
}

/// Redis client handle with MessagePack struct helpers.
///
/// Uses `ConnectionManager` for reconnection and connection reuse. Cloning is
/// cheap and shares the underlying connection.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// Returns the handle together with the PING reply (`"PONG"`).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidSettings`] if the address is malformed and
    /// [`CacheError::Connection`] if the connection cannot be established or the
    /// PING fails.
    pub async fn connect(config: &CacheConfig) -> CacheResult<(Self, String)> {
        let url = connection_url(config)?;
        info!("Connecting to Redis at {}", mask_connection_string(url.as_str()));

        let client = Client::open(url.as_str()).map_err(CacheError::Connection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(CacheError::Connection)?;

        let cache = Self { conn: manager };
        let pong = cache
            .conn
            .clone()
            .ping::<String>()
            .await
            .map_err(CacheError::Connection)?;

        info!("Connected to Redis (db {})", config.db);

        Ok((cache, pong))
    }

    /// Sends PING and returns the reply.
    pub async fn ping(&self) -> CacheResult<String> {
        let mut conn = self.conn.clone();
        Ok(conn.ping::<String>().await?)
    }

    /// Encodes `value` as MessagePack and stores it under `key`.
    ///
    /// A zero `expiration` stores the value without expiry. Durations that are
    /// not whole seconds are stored with millisecond precision, rounded up to
    /// one millisecond.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Encode`] if `value` cannot be serialized (nothing is
    /// written) and [`CacheError::Command`] if the write fails.
    pub async fn set_struct<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expiration: Duration,
    ) -> CacheResult<()> {
        let bytes = codec::encode(value)?;
        let mut conn = self.conn.clone();

        match Expiry::from_duration(expiration) {
            Expiry::Persist => conn.set::<_, _, ()>(key, bytes).await?,
            Expiry::Seconds(secs) => conn.set_ex::<_, _, ()>(key, bytes, secs).await?,
            Expiry::Millis(millis) => conn.pset_ex::<_, _, ()>(key, bytes, millis).await?,
        }

        debug!("Cache SET: {} (TTL: {:?})", key, expiration);
        Ok(())
    }

    /// Fetches `key` and decodes it into `T`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::NotFound`] if the key does not exist
    /// - [`CacheError::Decode`] if the stored bytes are not a valid `T`
    /// - [`CacheError::Command`] if the read fails
    pub async fn get_struct<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        self.try_get_struct(key)
            .await?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    /// Like [`get_struct`](Self::get_struct) but reports a missing key as `Ok(None)`.
    pub async fn try_get_struct<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<Vec<u8>>>(key).await? {
            Some(bytes) => {
                debug!("Cache HIT: {}", key);
                codec::decode(&bytes).map(Some)
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    /// Removes `key`. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let deleted = conn.del::<_, usize>(key).await?;
        Ok(deleted > 0)
    }

    /// A connection for commands not wrapped by this handle.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        let config = CacheConfig {
            addr: "cache.internal:6380".to_string(),
            password: String::new(),
            db: 3,
        };

        let url = connection_url(&config).unwrap();
        assert_eq!(url.as_str(), "redis://cache.internal:6380/3");
    }

    #[test]
    fn test_connection_url_with_password() {
        let config = CacheConfig {
            addr: "127.0.0.1:6379".to_string(),
            password: "s3cr@t".to_string(),
            db: 0,
        };

        let url = connection_url(&config).unwrap();
        assert_eq!(url.as_str(), "redis://:s3cr%40t@127.0.0.1:6379/0");
    }

    #[test]
    fn test_expiry_from_duration() {
        assert_eq!(Expiry::from_duration(Duration::ZERO), Expiry::Persist);
        assert_eq!(Expiry::from_duration(Duration::from_secs(60)), Expiry::Seconds(60));
        assert_eq!(Expiry::from_duration(Duration::from_millis(150)), Expiry::Millis(150));
        assert_eq!(Expiry::from_duration(Duration::from_millis(1500)), Expiry::Millis(1500));
    }

    #[test]
    fn test_expiry_below_one_millisecond_is_rounded_up() {
        assert_eq!(Expiry::from_duration(Duration::from_micros(500)), Expiry::Millis(1));
        assert_eq!(Expiry::from_duration(Duration::from_nanos(1)), Expiry::Millis(1));
        // sub-millisecond remainder on a whole second still needs PSETEX
        assert_eq!(
            Expiry::from_duration(Duration::from_secs(2) + Duration::from_micros(10)),
            Expiry::Millis(2000)
        );
    }

    #[test]
    fn test_connection_url_rejects_bad_address() {
        let config = CacheConfig {
            addr: "127.0.0.1:notaport".to_string(),
            ..CacheConfig::default()
        };

        assert!(matches!(
            connection_url(&config),
            Err(CacheError::InvalidSettings(_))
        ));
    }
}
