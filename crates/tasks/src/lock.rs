//! Distributed job lock
//!
//! One holder per job across all task runner instances. The lock is a
//! Redis key set with `SET NX PX` holding a random token; release deletes
//! the key only while it still holds that token. The TTL caps how long a
//! crashed holder can block the job.

use async_trait::async_trait;
use athena_common::cache::{keys, Cache};
use athena_common::errors::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Atomic primitives the lock needs from its backing store
#[async_trait]
pub trait LockStore: Send + Sync {
    async fn set_nx_px(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool>;

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool>;
}

#[async_trait]
impl LockStore for Cache {
    async fn set_nx_px(&self, key: &str, value: &str, ttl_ms: u64) -> Result<bool> {
        Cache::set_nx_px(self, key, value, ttl_ms).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        Cache::delete_if_equals(self, key, expected).await
    }
}

/// Proof of holding a job lock
#[derive(Debug)]
pub struct LockGuard {
    key: String,
    token: String,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn LockStore>,
    lock_at_most: Duration,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn LockStore>, lock_at_most: Duration) -> Self {
        Self { store, lock_at_most }
    }

    /// Take the lock for `job`; `None` when another holder has it
    pub async fn try_acquire(&self, job: &str) -> Result<Option<LockGuard>> {
        let key = keys::job_lock(job);
        let token = Uuid::new_v4().to_string();
        let ttl_ms = self.lock_at_most.as_millis().max(1) as u64;

        if self.store.set_nx_px(&key, &token, ttl_ms).await? {
            debug!(job, ttl_ms, "Acquired job lock");
            Ok(Some(LockGuard { key, token }))
        } else {
            Ok(None)
        }
    }

    pub async fn release(&self, guard: LockGuard) -> Result<()> {
        if !self.store.delete_if_equals(&guard.key, &guard.token).await? {
            warn!(key = %guard.key, "Job lock expired before release");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory stand-in for Redis
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl LockStore for MemoryStore {
        async fn set_nx_px(&self, key: &str, value: &str, _ttl_ms: u64) -> Result<bool> {
            let mut entries = self.entries.lock().await;
            if entries.contains_key(key) {
                return Ok(false);
            }
            entries.insert(key.to_string(), value.to_string());
            Ok(true)
        }

        async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
            let mut entries = self.entries.lock().await;
            if entries.get(key).map(String::as_str) == Some(expected) {
                entries.remove(key);
                return Ok(true);
            }
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let lock = DistributedLock::new(Arc::new(MemoryStore::default()), Duration::from_secs(60));

        let guard = lock.try_acquire("weekly-digest").await.unwrap().unwrap();
        assert_eq!(guard.key(), "lock:weekly-digest");
        assert!(lock.try_acquire("weekly-digest").await.unwrap().is_none());

        // Other jobs are independent
        assert!(lock.try_acquire("sam-gov-import").await.unwrap().is_some());

        lock.release(guard).await.unwrap();
        assert!(lock.try_acquire("weekly-digest").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_checks_token() {
        let store = Arc::new(MemoryStore::default());
        let lock = DistributedLock::new(store.clone(), Duration::from_secs(60));

        let stale = LockGuard {
            key: keys::job_lock("opportunity-scoring"),
            token: "someone-else".to_string(),
        };
        let held = lock.try_acquire("opportunity-scoring").await.unwrap().unwrap();

        lock.release(stale).await.unwrap();
        assert!(lock.try_acquire("opportunity-scoring").await.unwrap().is_none());

        lock.release(held).await.unwrap();
        assert!(lock.try_acquire("opportunity-scoring").await.unwrap().is_some());
    }
}
