//! In-memory lock store for tests and single-node runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::lock::{LockError, LockKeys};
use crate::ports::{DistributedLock, HeldLock, LockOwnership};

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    expires_at: Instant,
}

/// Lock store backed by a map of key to owner token with expiry.
///
/// Expiry is checked on access, matching store-side PX semantics. Every
/// acquire attempt also drops expired entries so the map stays bounded by
/// the live keys.
#[derive(Debug, Default)]
pub struct InMemoryDistributedLock {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryDistributedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner token currently stored under `key`, ignoring expired entries.
    pub async fn holder_of(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.token.clone())
    }

    /// Number of live keys.
    pub async fn held_count(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().await.values().filter(|e| e.expires_at > now).count()
    }
}

#[async_trait]
impl DistributedLock for InMemoryDistributedLock {
    async fn try_acquire(&self, keys: &LockKeys, lease: Duration) -> Result<Option<HeldLock>, LockError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.expires_at > now);

        let contended = keys
            .iter()
            .any(|k| entries.get(k.as_str()).is_some_and(|e| e.expires_at > now));
        if contended {
            return Ok(None);
        }

        let token = Uuid::new_v4().to_string();
        for key in keys.iter() {
            entries.insert(
                key.as_str().to_string(),
                Entry {
                    token: token.clone(),
                    expires_at: now + lease,
                },
            );
        }

        Ok(Some(HeldLock::new(LockOwnership::new(keys.clone(), token))))
    }

    async fn release(&self, lock: HeldLock) -> Result<bool, LockError> {
        let ownership = lock.ownership();
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let mut released = 0;
        for key in ownership.keys().iter() {
            let owned = entries
                .get(key.as_str())
                .is_some_and(|e| e.token == ownership.token() && e.expires_at > now);
            if owned {
                entries.remove(key.as_str());
                released += 1;
            }
        }

        Ok(released == ownership.keys().len())
    }

    async fn renew(&self, ownership: &LockOwnership, lease: Duration) -> Result<bool, LockError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let mut renewed = 0;
        for key in ownership.keys().iter() {
            if let Some(entry) = entries.get_mut(key.as_str()) {
                if entry.token == ownership.token() && entry.expires_at > now {
                    entry.expires_at = now + lease;
                    renewed += 1;
                }
            }
        }

        Ok(renewed == ownership.keys().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lock::{KeyResolver, LockName};

    fn keys(values: Vec<&str>) -> LockKeys {
        KeyResolver::resolve(LockName::DiaryWrite, values).unwrap()
    }

    const LEASE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn second_acquire_of_held_key_fails() {
        let store = InMemoryDistributedLock::new();
        let first = store.try_acquire(&keys(vec!["1"]), LEASE).await.unwrap();
        assert!(first.is_some());

        let second = store.try_acquire(&keys(vec!["1"]), LEASE).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn composite_acquire_takes_nothing_when_one_key_is_held() {
        let store = InMemoryDistributedLock::new();
        let _held = store.try_acquire(&keys(vec!["b"]), LEASE).await.unwrap().unwrap();

        let composite = store.try_acquire(&keys(vec!["a", "b", "c"]), LEASE).await.unwrap();

        assert!(composite.is_none());
        assert!(store.holder_of("DIARY_WRITE_a").await.is_none());
        assert!(store.holder_of("DIARY_WRITE_c").await.is_none());
    }

    #[tokio::test]
    async fn release_frees_all_keys() {
        let store = InMemoryDistributedLock::new();
        let held = store.try_acquire(&keys(vec!["a", "b"]), LEASE).await.unwrap().unwrap();

        assert!(store.release(held).await.unwrap());
        assert_eq!(store.held_count().await, 0);
    }

    #[tokio::test]
    async fn release_after_takeover_leaves_new_owner_in_place() {
        let store = InMemoryDistributedLock::new();
        let short = store
            .try_acquire(&keys(vec!["x"]), Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let next = store.try_acquire(&keys(vec!["x"]), LEASE).await.unwrap().unwrap();
        let next_token = next.ownership().token().to_string();

        assert!(!store.release(short).await.unwrap());
        assert_eq!(store.holder_of("DIARY_WRITE_x").await, Some(next_token));
    }

    #[tokio::test]
    async fn acquire_drops_expired_entries_of_other_keys() {
        let store = InMemoryDistributedLock::new();
        for value in ["e1", "e2", "e3"] {
            store
                .try_acquire(&keys(vec![value]), Duration::from_millis(10))
                .await
                .unwrap()
                .unwrap();
        }
        assert_eq!(store.entries.lock().await.len(), 3);
        tokio::time::sleep(Duration::from_millis(30)).await;

        let _live = store.try_acquire(&keys(vec!["fresh"]), LEASE).await.unwrap().unwrap();

        let entries = store.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("DIARY_WRITE_fresh"));
    }

    #[tokio::test]
    async fn renew_extends_only_owned_keys() {
        let store = InMemoryDistributedLock::new();
        let held = store
            .try_acquire(&keys(vec!["r"]), Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();

        assert!(store.renew(held.ownership(), LEASE).await.unwrap());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.holder_of("DIARY_WRITE_r").await.is_some());

        let stranger = LockOwnership::new(keys(vec!["r"]), "someone-else");
        assert!(!store.renew(&stranger, LEASE).await.unwrap());
    }
}
