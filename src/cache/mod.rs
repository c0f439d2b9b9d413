/// Redis-backed cache layer
///
/// Holds the session-token mapping the identity layer consumes
/// (`auth_<token>` -> user id with a 24h TTL) and answers the liveness
/// probe used by status reporting. The core file operations never read
/// from the cache.
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

/// Redis cache client
#[derive(Clone)]
pub struct CacheClient {
    connection: ConnectionManager,
    config: CacheConfig,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CacheClient {
    /// Create a new cache client. Fails with `Unavailable` when redis
    /// cannot be reached; callers degrade instead of crashing.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        if !config.enabled {
            return Err(Error::Unavailable("Cache is disabled".to_string()));
        }

        info!("Connecting to Redis at {}", config.redis_url);

        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| Error::Unavailable(format!("Redis client creation failed: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Unavailable(format!("Redis connection failed: {}", e)))?;

        info!("Redis connection established");

        Ok(Self { connection, config })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Get a value from cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let cache_key = self.build_key(key);

        let mut conn = self.connection.clone();
        let result: Option<String> = conn
            .get(&cache_key)
            .await
            .map_err(|e| Error::Unavailable(format!("Cache get failed: {}", e)))?;

        match result {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Dropping corrupted cache entry {}: {}", cache_key, e);
                    let _ = self.delete(key).await;
                    Ok(None)
                }
            },
            None => {
                debug!("Cache MISS: {}", cache_key);
                Ok(None)
            }
        }
    }

    /// Set a value with a TTL in seconds (`None` uses the default TTL)
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<()> {
        let cache_key = self.build_key(key);
        let ttl = ttl_secs.unwrap_or(self.config.default_ttl);

        let json = serde_json::to_string(value)
            .map_err(|e| Error::Internal(format!("Cache serialization failed: {}", e)))?;

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(&cache_key, json, ttl)
            .await
            .map_err(|e| Error::Unavailable(format!("Cache set failed: {}", e)))?;

        debug!("Cache SET: {} (TTL: {}s)", cache_key, ttl);
        Ok(())
    }

    /// Delete a value
    pub async fn delete(&self, key: &str) -> Result<()> {
        let cache_key = self.build_key(key);

        let mut conn = self.connection.clone();
        conn.del::<_, ()>(&cache_key)
            .await
            .map_err(|e| Error::Unavailable(format!("Cache delete failed: {}", e)))?;

        Ok(())
    }

    /// Ping Redis to check the connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Unavailable(format!("Cache ping failed: {}", e)))?;

        if pong != "PONG" {
            return Err(Error::Unavailable(
                "Unexpected Redis PING response".to_string(),
            ));
        }

        Ok(())
    }
}
