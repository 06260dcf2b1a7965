//! LockCoordinator - runs an operation while holding a distributed lock.
//!
//! ## Lifecycle
//!
//! 1. Resolve the lock keys from the caller's key extractor
//! 2. Retry `try_acquire` until the wait bound elapses (or the cancel
//!    signal fires)
//! 3. Run the operation; with a watchdog lease, a background task keeps
//!    extending the lease meanwhile
//! 4. Release with the owner token on every exit path
//!
//! The normal path awaits the release. If the operation panics or the
//! caller drops the future, a guard hands the release to the runtime.
//!
//! ## Ordering
//!
//! Callers run their transactional unit inside `operation`, so the lock is
//! taken before the transaction starts and released after it ends.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::domain::foundation::StateMachine;
use crate::domain::lock::{IntoLockValues, KeyResolver, LeaseTime, LockError, LockKeys, LockPhase, LockSpec};
use crate::ports::{DistributedLock, HeldLock, LockOwnership};

/// Tuning for the coordinator.
#[derive(Debug, Clone)]
pub struct LockCoordinatorConfig {
    /// Pause between acquisition attempts.
    pub retry_interval: Duration,

    /// Store-side lease used with `LeaseTime::Watchdog`; renewed every third.
    pub watchdog_lease: Duration,
}

impl Default for LockCoordinatorConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(50),
            watchdog_lease: Duration::from_secs(30),
        }
    }
}

impl LockCoordinatorConfig {
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_watchdog_lease(mut self, lease: Duration) -> Self {
        self.watchdog_lease = lease;
        self
    }
}

/// Serializes operations across processes by named keys.
#[derive(Clone)]
pub struct LockCoordinator {
    store: Arc<dyn DistributedLock>,
    config: LockCoordinatorConfig,
}

impl LockCoordinator {
    pub fn new(store: Arc<dyn DistributedLock>) -> Self {
        Self::with_config(store, LockCoordinatorConfig::default())
    }

    pub fn with_config(store: Arc<dyn DistributedLock>, config: LockCoordinatorConfig) -> Self {
        Self { store, config }
    }

    /// Runs `operation` while holding the keys produced by `key_extractor`.
    ///
    /// # Errors
    ///
    /// - `LockError::Configuration` if the extractor yields no usable value
    /// - `LockError::AcquisitionTimeout` if the keys stay held for `spec.wait`
    /// - `LockError::Unavailable` if the store cannot be reached
    ///
    /// In each of these cases `operation` is not run. Otherwise its own
    /// result is returned unchanged.
    pub async fn with_lock<V, F, Fut, T, E>(&self, spec: LockSpec, key_extractor: impl FnOnce() -> V, operation: F) -> Result<T, E>
    where
        V: IntoLockValues,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        self.execute(spec, key_extractor, None, operation).await
    }

    /// Like [`with_lock`](Self::with_lock), but gives up waiting with
    /// `LockError::Cancelled` once `cancel` becomes `true`.
    ///
    /// Cancellation only affects acquisition; a running operation is never
    /// interrupted.
    pub async fn with_lock_cancellable<V, F, Fut, T, E>(
        &self,
        spec: LockSpec,
        key_extractor: impl FnOnce() -> V,
        mut cancel: watch::Receiver<bool>,
        operation: F,
    ) -> Result<T, E>
    where
        V: IntoLockValues,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        self.execute(spec, key_extractor, Some(&mut cancel), operation).await
    }

    async fn execute<V, F, Fut, T, E>(
        &self,
        spec: LockSpec,
        key_extractor: impl FnOnce() -> V,
        cancel: Option<&mut watch::Receiver<bool>>,
        operation: F,
    ) -> Result<T, E>
    where
        V: IntoLockValues,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let keys = KeyResolver::resolve(spec.name, key_extractor())?;
        let mut phase = PhaseTracker::new(keys.to_string());

        phase.advance(LockPhase::Acquiring);
        let held = match self.acquire(&keys, &spec, cancel).await {
            Ok(held) => held,
            Err(e) => {
                match e {
                    LockError::AcquisitionTimeout { .. } => {
                        phase.advance(LockPhase::TimedOut);
                        tracing::warn!(lock = %keys, wait_ms = spec.wait.as_millis() as u64, "Lock wait timed out");
                    }
                    _ => {
                        phase.advance(LockPhase::Idle);
                        tracing::warn!(lock = %keys, error = %e, "Lock acquisition abandoned");
                    }
                }
                return Err(e.into());
            }
        };
        phase.advance(LockPhase::Held);

        let watchdog = match spec.lease {
            LeaseTime::Watchdog => Some(self.spawn_watchdog(held.ownership().clone())),
            LeaseTime::Fixed(_) => None,
        };
        let guard = ReleaseGuard::new(self.store.clone(), held);

        let result = operation().await;

        drop(watchdog);
        if let LeaseTime::Fixed(lease) = spec.lease {
            let held_for = guard.held_for();
            if held_for > lease {
                tracing::warn!(
                    lock = %keys,
                    lease_ms = lease.as_millis() as u64,
                    held_ms = held_for.as_millis() as u64,
                    "Operation outlived its lock lease; mutual exclusion was not guaranteed"
                );
            }
        }

        phase.advance(LockPhase::Releasing);
        guard.release().await;
        phase.advance(LockPhase::Idle);

        result
    }

    async fn acquire(
        &self,
        keys: &LockKeys,
        spec: &LockSpec,
        mut cancel: Option<&mut watch::Receiver<bool>>,
    ) -> Result<HeldLock, LockError> {
        let lease = match spec.lease {
            LeaseTime::Fixed(lease) => lease,
            LeaseTime::Watchdog => self.config.watchdog_lease,
        };
        let deadline = Instant::now() + spec.wait;

        loop {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                return Err(LockError::Cancelled { key: keys.to_string() });
            }

            if let Some(held) = self.store.try_acquire(keys, lease).await? {
                return Ok(held);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::AcquisitionTimeout {
                    key: keys.to_string(),
                    waited: spec.wait,
                });
            }
            let pause = self.config.retry_interval.min(deadline - now);

            let sender_gone = match cancel.as_deref_mut() {
                Some(rx) => tokio::select! {
                    _ = time::sleep(pause) => false,
                    changed = rx.changed() => changed.is_err(),
                },
                None => {
                    time::sleep(pause).await;
                    false
                }
            };
            if sender_gone {
                // Nobody can cancel any more.
                cancel = None;
            }
        }
    }

    fn spawn_watchdog(&self, ownership: LockOwnership) -> Watchdog {
        let store = self.store.clone();
        let lease = self.config.watchdog_lease;
        let period = (lease / 3).max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                match store.renew(&ownership, lease).await {
                    Ok(true) => tracing::trace!(lock = %ownership.keys(), "Lock lease renewed"),
                    Ok(false) => {
                        tracing::warn!(lock = %ownership.keys(), "Lock ownership lost; stopping renewal");
                        break;
                    }
                    Err(e) => tracing::warn!(lock = %ownership.keys(), error = %e, "Lock renewal failed"),
                }
            }
        });

        Watchdog(handle)
    }
}

impl std::fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Logs every phase change of one `with_lock` call.
struct PhaseTracker {
    label: String,
    phase: LockPhase,
}

impl PhaseTracker {
    fn new(label: String) -> Self {
        Self {
            label,
            phase: LockPhase::Idle,
        }
    }

    fn advance(&mut self, next: LockPhase) {
        match self.phase.transition_to(next) {
            Ok(phase) => {
                tracing::debug!(lock = %self.label, from = self.phase.as_str(), to = phase.as_str(), "Lock phase");
                self.phase = phase;
            }
            Err(e) => tracing::error!(lock = %self.label, error = %e, "Invalid lock phase transition"),
        }
    }
}

/// Renewal task, aborted when dropped.
struct Watchdog(JoinHandle<()>);

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Releases the lock if the holder never got to call `release`.
struct ReleaseGuard {
    store: Arc<dyn DistributedLock>,
    lock: Option<HeldLock>,
}

impl ReleaseGuard {
    fn new(store: Arc<dyn DistributedLock>, lock: HeldLock) -> Self {
        Self { store, lock: Some(lock) }
    }

    fn held_for(&self) -> Duration {
        self.lock.as_ref().map(HeldLock::held_for).unwrap_or_default()
    }

    async fn release(mut self) {
        if let Some(lock) = self.lock.take() {
            release_and_log(self.store.clone(), lock).await;
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                tracing::debug!(lock = %lock.keys(), "Releasing lock after abandoned operation");
                runtime.spawn(release_and_log(self.store.clone(), lock));
            }
            Err(_) => {
                tracing::warn!(lock = %lock.keys(), "No runtime to release lock; it will expire with its lease");
            }
        }
    }
}

async fn release_and_log(store: Arc<dyn DistributedLock>, lock: HeldLock) {
    let label = lock.keys().to_string();
    match store.release(lock).await {
        Ok(true) => tracing::debug!(lock = %label, "Lock released"),
        Ok(false) => tracing::warn!(lock = %label, "Lock had already expired or changed owner before release"),
        Err(e) => tracing::error!(lock = %label, error = %e, "Lock release failed; it will expire with its lease"),
    }
}
