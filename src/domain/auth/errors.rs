//! Authentication errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Token and session failures.
///
/// `SessionInvalidated` deliberately covers both a replayed (already
/// rotated) refresh token and a logged-out session so callers cannot tell
/// them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Malformed token, bad signature, or wrong token kind.
    #[error("Invalid token")]
    InvalidToken,

    /// Signature valid but past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// The presented refresh token is not the principal's live session.
    #[error("Session is no longer valid")]
    SessionInvalidated,

    /// A configured lifetime pushes the expiry past the representable range.
    #[error("Token lifetime out of range")]
    LifetimeOutOfRange,

    /// The session store or signer is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should log in again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::SessionInvalidated
        )
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::InvalidToken => ErrorCode::Unauthorized,
            AuthError::TokenExpired => ErrorCode::TokenExpired,
            AuthError::SessionInvalidated => ErrorCode::SessionInvalidated,
            AuthError::LifetimeOutOfRange => ErrorCode::Misconfigured,
            AuthError::ServiceUnavailable(_) => ErrorCode::CacheError,
        }
    }
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_require_reauthentication() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(AuthError::SessionInvalidated.requires_reauthentication());
        assert!(!AuthError::service_unavailable("down").requires_reauthentication());
    }

    #[test]
    fn only_service_errors_are_transient() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(!AuthError::SessionInvalidated.is_transient());
    }

    #[test]
    fn session_invalidated_message_does_not_leak_cause() {
        assert_eq!(AuthError::SessionInvalidated.to_string(), "Session is no longer valid");
    }

    #[test]
    fn lifetime_out_of_range_is_a_configuration_fault() {
        let err = AuthError::LifetimeOutOfRange;
        assert!(!err.requires_reauthentication());
        assert!(!err.is_transient());
        assert_eq!(err.code(), ErrorCode::Misconfigured);
    }

    #[test]
    fn maps_to_domain_error_code() {
        let err: DomainError = AuthError::TokenExpired.into();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }
}
