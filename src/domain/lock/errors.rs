//! Lock error types.

use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

use super::LockName;

/// Failures of the distributed lock layer.
///
/// None of these are retried internally. `AcquisitionTimeout` is safe for
/// the caller to retry; `Configuration` is a bug at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The key extractor produced nothing usable.
    #[error("invalid lock key for {lock}: {reason}")]
    Configuration { lock: LockName, reason: String },

    /// Another holder kept the key for the whole wait window.
    #[error("could not acquire lock {key} within {}ms", .waited.as_millis())]
    AcquisitionTimeout { key: String, waited: Duration },

    /// The caller's cancel signal fired while waiting.
    #[error("lock acquisition for {key} was cancelled")]
    Cancelled { key: String },

    /// The lock store could not be reached.
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

impl LockError {
    pub fn configuration(lock: LockName, reason: impl Into<String>) -> Self {
        LockError::Configuration {
            lock,
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        LockError::Unavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LockError::Configuration { .. } => ErrorCode::Misconfigured,
            LockError::AcquisitionTimeout { .. } => ErrorCode::LockUnavailable,
            LockError::Cancelled { .. } => ErrorCode::Cancelled,
            LockError::Unavailable(_) => ErrorCode::CacheError,
        }
    }
}

impl From<LockError> for DomainError {
    fn from(err: LockError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            LockError::AcquisitionTimeout { key, .. } | LockError::Cancelled { key } => {
                DomainError::new(code, message).with_detail("key", key)
            }
            _ => DomainError::new(code, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_key_and_wait() {
        let err = LockError::AcquisitionTimeout {
            key: "DIARY_WRITE_42_20240309HTNC0".to_string(),
            waited: Duration::from_millis(5000),
        };
        assert_eq!(
            err.to_string(),
            "could not acquire lock DIARY_WRITE_42_20240309HTNC0 within 5000ms"
        );
    }

    #[test]
    fn timeout_maps_to_retryable_domain_error() {
        let err: DomainError = LockError::AcquisitionTimeout {
            key: "USER_UPDATE_1".to_string(),
            waited: Duration::from_millis(10),
        }
        .into();
        assert_eq!(err.code, ErrorCode::LockUnavailable);
        assert!(err.is_retryable());
        assert_eq!(err.details.get("key"), Some(&"USER_UPDATE_1".to_string()));
    }

    #[test]
    fn configuration_maps_to_misconfigured() {
        let err = LockError::configuration(LockName::DiaryWrite, "no value");
        assert_eq!(err.code(), ErrorCode::Misconfigured);
        assert!(!DomainError::from(err).is_retryable());
    }
}
