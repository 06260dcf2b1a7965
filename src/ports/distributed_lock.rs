//! DistributedLock port - cross-process mutual exclusion on named keys.
//!
//! The store only knows about keys and owner tokens. Waiting, leases and
//! release-on-every-exit-path live in the `LockCoordinator`.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::lock::{LockError, LockKeys};

/// Keys plus the owner token written into them.
///
/// Cloneable so a renewal task can extend the lease while the operation
/// runs; only [`HeldLock`] can release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOwnership {
    keys: LockKeys,
    token: String,
}

impl LockOwnership {
    pub fn new(keys: LockKeys, token: impl Into<String>) -> Self {
        Self {
            keys,
            token: token.into(),
        }
    }

    pub fn keys(&self) -> &LockKeys {
        &self.keys
    }

    /// Value stored under every key while held.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Runtime handle to an acquired lock.
///
/// Not `Clone`: [`DistributedLock::release`] consumes it, so the same
/// acquisition cannot be released twice.
#[derive(Debug)]
pub struct HeldLock {
    ownership: LockOwnership,
    acquired_at: Instant,
}

impl HeldLock {
    pub fn new(ownership: LockOwnership) -> Self {
        Self {
            ownership,
            acquired_at: Instant::now(),
        }
    }

    pub fn ownership(&self) -> &LockOwnership {
        &self.ownership
    }

    pub fn keys(&self) -> &LockKeys {
        self.ownership.keys()
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

/// Port for a lock store shared by every process.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Takes every key in `keys` or none of them.
    ///
    /// Returns `None` when any key is held by someone else. Never waits.
    async fn try_acquire(&self, keys: &LockKeys, lease: Duration) -> Result<Option<HeldLock>, LockError>;

    /// Deletes the keys still owned by this handle.
    ///
    /// Returns `false` when at least one key had already expired or been
    /// taken over, which means mutual exclusion may have been violated.
    async fn release(&self, lock: HeldLock) -> Result<bool, LockError>;

    /// Extends the expiry of keys still owned by `ownership`.
    ///
    /// Returns `false` once ownership of any key was lost.
    async fn renew(&self, ownership: &LockOwnership, lease: Duration) -> Result<bool, LockError>;
}
