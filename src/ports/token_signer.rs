//! TokenSigner port - turns claims into bearer tokens and back.

use crate::domain::auth::{AuthError, TokenClaims};

/// Signs and verifies tokens.
///
/// `verify` checks signature and expiry only. Whether a refresh token is
/// still the live session is the `RefreshTokenStore`'s concern.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError>;

    /// # Errors
    ///
    /// `TokenExpired` for a valid signature past `exp`, `InvalidToken` for
    /// anything else that fails verification.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}
