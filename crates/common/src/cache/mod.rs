//! Redis integration
//!
//! Provides:
//! - A shared multiplexed connection with key namespacing
//! - Connectivity checks for readiness probes
//! - Atomic set-if-absent / compare-and-delete primitives used for
//!   distributed job locks

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use redis::{aio::MultiplexedConnection, Client, Script};
use tokio::sync::RwLock;
use tracing::debug;

/// Deletes KEYS[1] only while it still holds ARGV[1]
const COMPARE_AND_DELETE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Redis client
pub struct Cache {
    connection: RwLock<MultiplexedConnection>,
    key_prefix: String,
}

impl Cache {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| AppError::CacheError {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Build a prefixed key
    pub fn key(&self, key: &str) -> String {
        prefixed(&self.key_prefix, key)
    }

    /// Set `key` to `value` with a millisecond TTL unless it already exists.
    /// Returns true when the key was set.
    pub async fn set_nx_px(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let reply: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to set key '{}': {}", full_key, e),
            })?;

        debug!(key = %full_key, acquired = reply.is_some(), "SET NX PX");
        Ok(reply.is_some())
    }

    /// Delete `key` only if it still holds `expected`.
    /// Returns true when the key was deleted.
    pub async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;

        let deleted: i32 = Script::new(COMPARE_AND_DELETE)
            .key(&full_key)
            .arg(expected)
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to release key '{}': {}", full_key, e),
            })?;

        Ok(deleted > 0)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.write().await;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

/// Key builder helpers
pub mod keys {
    /// Build a job lock key
    pub fn job_lock(job_name: &str) -> String {
        format!("lock:{}", job_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(keys::job_lock("weekly-digest"), "lock:weekly-digest");
        assert_eq!(
            prefixed("athena", &keys::job_lock("weekly-digest")),
            "athena:lock:weekly-digest"
        );
        assert_eq!(prefixed("", "lock:x"), "lock:x");
    }

    #[test]
    fn test_release_script_checks_owner() {
        assert!(COMPARE_AND_DELETE.contains("GET"));
        assert!(COMPARE_AND_DELETE.contains("ARGV[1]"));
    }
}
