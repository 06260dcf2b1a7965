//! RefreshTokenStore port - the one live refresh token per principal.

use async_trait::async_trait;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::domain::auth::{AuthError, PrincipalRef};

/// Port for refresh-token sessions.
///
/// At most one token is stored per `(kind, id)`. Saving overwrites, which is
/// what makes a rotated token unusable.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Stores `token` as the principal's session, replacing any previous one.
    async fn save(&self, principal: &PrincipalRef, token: &str, ttl: Duration) -> Result<(), AuthError>;

    /// The live token, if any.
    async fn find(&self, principal: &PrincipalRef) -> Result<Option<String>, AuthError>;

    /// Removes the session. Deleting a missing session is not an error.
    async fn delete(&self, principal: &PrincipalRef) -> Result<(), AuthError>;

    /// True only when `candidate` equals the stored token exactly.
    async fn validate(&self, principal: &PrincipalRef, candidate: &str) -> Result<bool, AuthError> {
        Ok(self
            .find(principal)
            .await?
            .is_some_and(|stored| tokens_match(&stored, candidate)))
    }

    /// Replaces the session with `new_token` only if `presented` is still the
    /// live token. Check and write happen as one atomic step, so of two
    /// concurrent rotations with the same token exactly one returns `true`.
    async fn rotate(
        &self,
        principal: &PrincipalRef,
        presented: &str,
        new_token: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError>;
}

/// Constant-time token comparison.
pub fn tokens_match(stored: &str, candidate: &str) -> bool {
    stored.as_bytes().ct_eq(candidate.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_match_requires_exact_equality() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("abc", ""));
    }
}
