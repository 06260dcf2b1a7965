//! What to serialize and how long to wait for / hold the lock.

use std::time::Duration;

use super::LockName;

/// Default time to wait for a contended lock.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(5000);

/// Default lease before the store expires an unreleased lock.
pub const DEFAULT_LEASE: Duration = Duration::from_millis(5000);

/// How long a held lock survives without an explicit release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseTime {
    /// Store-side expiry after the given duration. If the critical section
    /// runs longer, the lock silently lapses while the work continues.
    Fixed(Duration),
    /// The coordinator keeps extending the lease while the holder runs.
    Watchdog,
}

impl LeaseTime {
    /// Fixed lease in milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        LeaseTime::Fixed(Duration::from_millis(ms))
    }
}

/// Declares which lock namespace an operation uses and its timing bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSpec {
    pub name: LockName,
    pub wait: Duration,
    pub lease: LeaseTime,
}

impl LockSpec {
    /// Spec with the default 5s wait and 5s lease.
    pub fn new(name: LockName) -> Self {
        Self {
            name,
            wait: DEFAULT_WAIT,
            lease: LeaseTime::Fixed(DEFAULT_LEASE),
        }
    }

    /// Builder: override the wait bound.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Builder: override the lease.
    pub fn with_lease(mut self, lease: LeaseTime) -> Self {
        self.lease = lease;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_five_second_defaults() {
        let spec = LockSpec::new(LockName::DiaryWrite);
        assert_eq!(spec.wait, Duration::from_millis(5000));
        assert_eq!(spec.lease, LeaseTime::Fixed(Duration::from_millis(5000)));
    }

    #[test]
    fn builders_override_timing() {
        let spec = LockSpec::new(LockName::MemberRegister)
            .with_wait(Duration::from_millis(100))
            .with_lease(LeaseTime::Watchdog);
        assert_eq!(spec.wait, Duration::from_millis(100));
        assert_eq!(spec.lease, LeaseTime::Watchdog);
    }
}
