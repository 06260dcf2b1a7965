//! Token claims, pairs and token masking for logs.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AdminId, MemberId};

use super::{AuthError, Principal, PrincipalKind, PrincipalRef, Role};

/// Which half of a pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims encoded into every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Principal id within its namespace.
    pub sub: String,
    pub kind: PrincipalKind,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub token_use: TokenUse,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Unique token id; two pairs issued in the same second still differ.
    pub jti: String,
}

impl TokenClaims {
    /// Rebuilds the principal from the claims.
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let reference = match self.kind {
            PrincipalKind::Member => {
                let id: MemberId = self.sub.parse().map_err(|_| AuthError::InvalidToken)?;
                PrincipalRef::member(id)
            }
            PrincipalKind::Admin => {
                let id: AdminId = self.sub.parse().map_err(|_| AuthError::InvalidToken)?;
                PrincipalRef::admin(id)
            }
        };
        Ok(Principal {
            reference,
            roles: self.roles.clone(),
        })
    }
}

/// Access + refresh tokens returned on login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Shortens a token for log output: first 10 and last 5 characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 20 {
        return "***".to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{}...{}", head, tail)
}
