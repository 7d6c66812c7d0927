use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;

/// Short-lived JSON entries in Redis. Every write carries a TTL; there is no
/// way to store a key that never expires.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!("connected to Redis");
        Ok(Self { conn })
    }

    pub async fn put_expiring<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<(), AppError> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("failed to encode cache entry {key}: {e}")))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, encoded, ttl_secs).await?;
        Ok(())
    }

    /// Missing keys and entries that no longer decode both read as `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    /// Returns whether the key existed.
    pub async fn remove(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await.map(|_| ())
    }
}
