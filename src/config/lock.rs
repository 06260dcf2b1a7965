//! Distributed lock configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::lock::{LeaseTime, LockName, LockSpec};

use super::error::ValidationError;

/// Lease value that selects watchdog renewal instead of a fixed expiry.
pub const WATCHDOG_LEASE: i64 = -1;

/// Default timing for locked operations
#[derive(Debug, Clone, Deserialize)]
pub struct LockConfig {
    /// How long a caller waits for a contended lock, in milliseconds
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Lease in milliseconds, or -1 for watchdog renewal
    #[serde(default = "default_lease_ms")]
    pub lease_ms: i64,

    /// Pause between acquisition attempts, in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Lease kept alive by the watchdog, in milliseconds
    #[serde(default = "default_watchdog_lease_ms")]
    pub watchdog_lease_ms: u64,
}

impl LockConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn lease(&self) -> LeaseTime {
        if self.lease_ms == WATCHDOG_LEASE {
            LeaseTime::Watchdog
        } else {
            LeaseTime::from_millis(self.lease_ms.max(0).unsigned_abs())
        }
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn watchdog_lease(&self) -> Duration {
        Duration::from_millis(self.watchdog_lease_ms)
    }

    /// Spec for `name` using the configured timing.
    pub fn spec(&self, name: LockName) -> LockSpec {
        LockSpec::new(name).with_wait(self.wait()).with_lease(self.lease())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lease_ms == 0 || self.lease_ms < WATCHDOG_LEASE {
            return Err(ValidationError::InvalidLockTiming("lease must be positive or -1"));
        }
        if self.retry_interval_ms == 0 {
            return Err(ValidationError::InvalidLockTiming("retry interval must be positive"));
        }
        if self.watchdog_lease_ms < 3 {
            return Err(ValidationError::InvalidLockTiming("watchdog lease must be at least 3ms"));
        }
        Ok(())
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_ms: default_wait_ms(),
            lease_ms: default_lease_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            watchdog_lease_ms: default_watchdog_lease_ms(),
        }
    }
}

fn default_wait_ms() -> u64 {
    5000
}

fn default_lease_ms() -> i64 {
    5000
}

fn default_retry_interval_ms() -> u64 {
    50
}

fn default_watchdog_lease_ms() -> u64 {
    30_000
}
