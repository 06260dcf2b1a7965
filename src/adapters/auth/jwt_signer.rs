//! HS256 JWT signer.
//!
//! ## Security
//!
//! - The shared secret is only read once to build the keys; it is held as
//!   `secrecy::SecretString` everywhere else
//! - Expiry is validated with zero leeway

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::auth::{AuthError, TokenClaims};
use crate::ports::TokenSigner;

/// Signs tokens with a shared HMAC secret.
pub struct JwtTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenSigner {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        }
    }
}

impl TokenSigner for JwtTokenSigner {
    fn sign(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AuthError::service_unavailable("token signing failed")
        })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            })
    }
}

impl std::fmt::Debug for JwtTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::{PrincipalKind, Role, TokenUse};
    use crate::domain::foundation::Timestamp;

    fn signer(secret: &str) -> JwtTokenSigner {
        JwtTokenSigner::new(&SecretString::new(secret.to_string()))
    }

    fn claims(exp_offset_secs: i64) -> TokenClaims {
        let now = Timestamp::now().as_unix_secs();
        TokenClaims {
            sub: "7".to_string(),
            kind: PrincipalKind::Member,
            roles: vec![Role::Member],
            token_use: TokenUse::Access,
            iat: now,
            exp: now + exp_offset_secs,
            jti: "jti-test".to_string(),
        }
    }

    #[test]
    fn signed_token_verifies_to_same_claims() {
        let signer = signer("test-secret-with-enough-entropy");
        let original = claims(60);

        let token = signer.sign(&original).unwrap();
        let verified = signer.verify(&token).unwrap();

        assert_eq!(verified, original);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let signer = signer("test-secret-with-enough-entropy");
        let token = signer.sign(&claims(-10)).unwrap();

        assert_eq!(signer.verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let token = signer("secret-a-secret-a-secret-a").sign(&claims(60)).unwrap();

        let result = signer("secret-b-secret-b-secret-b").verify(&token);

        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(signer("s").verify("not.a.jwt"), Err(AuthError::InvalidToken));
    }
}
