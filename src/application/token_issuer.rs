//! TokenIssuer - issues, rotates and revokes token pairs.
//!
//! Each principal has exactly one live refresh token. Refreshing replaces
//! it, so a refresh token works once: presenting it again after a rotation
//! fails with `SessionInvalidated`.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::auth::{mask_token, AuthError, Principal, PrincipalRef, TokenClaims, TokenPair, TokenUse};
use crate::domain::foundation::{RequestContext, Timestamp};
use crate::ports::{RefreshTokenStore, TokenSigner};

/// Token lifetimes. Access tokens live minutes, refresh tokens days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenLifetimes {
    pub fn new(access_minutes: u64, refresh_days: u64) -> Self {
        Self {
            access: Duration::from_secs(access_minutes.saturating_mul(60)),
            refresh: Duration::from_secs(refresh_days.saturating_mul(24 * 60 * 60)),
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self::new(30, 14)
    }
}

pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    sessions: Arc<dyn RefreshTokenStore>,
    lifetimes: TokenLifetimes,
}

impl TokenIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, sessions: Arc<dyn RefreshTokenStore>, lifetimes: TokenLifetimes) -> Self {
        Self {
            signer,
            sessions,
            lifetimes,
        }
    }

    /// Issues a fresh pair and makes its refresh token the live session.
    pub async fn issue(&self, principal: &Principal, ctx: &RequestContext) -> Result<TokenPair, AuthError> {
        let pair = self.sign_pair(principal)?;
        self.sessions
            .save(&principal.reference, &pair.refresh_token, self.lifetimes.refresh)
            .await?;

        tracing::info!(
            request_id = %ctx.request_id,
            principal = %principal.reference,
            access_ttl_secs = self.lifetimes.access.as_secs(),
            refresh_ttl_secs = self.lifetimes.refresh.as_secs(),
            refresh_token = %mask_token(&pair.refresh_token),
            "Issued token pair"
        );
        Ok(pair)
    }

    /// Exchanges the live refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` for a bad signature or an access token
    /// - `TokenExpired` past the refresh token's expiry
    /// - `SessionInvalidated` if the token was rotated away or logged out
    pub async fn refresh(&self, presented: &str, ctx: &RequestContext) -> Result<TokenPair, AuthError> {
        let claims = self.signer.verify(presented)?;
        if claims.token_use != TokenUse::Refresh {
            tracing::warn!(request_id = %ctx.request_id, "Access token presented for refresh");
            return Err(AuthError::InvalidToken);
        }
        let principal = claims.principal()?;

        let pair = self.sign_pair(&principal)?;
        let rotated = self
            .sessions
            .rotate(&principal.reference, presented, &pair.refresh_token, self.lifetimes.refresh)
            .await?;
        if !rotated {
            tracing::warn!(
                request_id = %ctx.request_id,
                principal = %principal.reference,
                refresh_token = %mask_token(presented),
                "Refresh token is not the live session"
            );
            return Err(AuthError::SessionInvalidated);
        }

        tracing::info!(
            request_id = %ctx.request_id,
            principal = %principal.reference,
            refresh_token = %mask_token(&pair.refresh_token),
            "Rotated refresh token"
        );
        Ok(pair)
    }

    /// Resolves the principal of an access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Principal, AuthError> {
        let claims = self.signer.verify(access_token)?;
        if claims.token_use != TokenUse::Access {
            return Err(AuthError::InvalidToken);
        }
        claims.principal()
    }

    /// Ends the principal's session. Idempotent.
    pub async fn logout(&self, principal: &PrincipalRef, ctx: &RequestContext) -> Result<(), AuthError> {
        self.sessions.delete(principal).await?;
        tracing::info!(request_id = %ctx.request_id, principal = %principal, "Logged out");
        Ok(())
    }

    /// Administrative logout of another principal.
    pub async fn force_logout(&self, principal: &PrincipalRef, ctx: &RequestContext) -> Result<(), AuthError> {
        self.sessions.delete(principal).await?;
        tracing::warn!(request_id = %ctx.request_id, principal = %principal, "Session forcibly revoked");
        Ok(())
    }

    fn sign_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        let now = Timestamp::now();
        Ok(TokenPair {
            access_token: self.signer.sign(&self.claims(principal, TokenUse::Access, &now)?)?,
            refresh_token: self.signer.sign(&self.claims(principal, TokenUse::Refresh, &now)?)?,
        })
    }

    fn claims(&self, principal: &Principal, token_use: TokenUse, now: &Timestamp) -> Result<TokenClaims, AuthError> {
        let ttl = match token_use {
            TokenUse::Access => self.lifetimes.access,
            TokenUse::Refresh => self.lifetimes.refresh,
        };
        let expires_at = now.checked_plus(ttl).ok_or_else(|| {
            tracing::error!(token_use = ?token_use, ttl_secs = ttl.as_secs(), "Token lifetime overflows expiry");
            AuthError::LifetimeOutOfRange
        })?;
        Ok(TokenClaims {
            sub: principal.reference.id.to_string(),
            kind: principal.reference.kind,
            roles: principal.roles.clone(),
            token_use,
            iat: now.as_unix_secs(),
            exp: expires_at.as_unix_secs(),
            jti: Uuid::new_v4().to_string(),
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("lifetimes", &self.lifetimes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::JwtTokenSigner;
    use crate::adapters::memory::InMemoryRefreshTokenStore;
    use crate::domain::foundation::{AdminId, MemberId};
    use secrecy::SecretString;

    fn issuer() -> (TokenIssuer, Arc<InMemoryRefreshTokenStore>) {
        let signer = Arc::new(JwtTokenSigner::new(&SecretString::new("unit-test-secret".to_string())));
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        (TokenIssuer::new(signer, store.clone(), TokenLifetimes::default()), store)
    }

    fn member(id: i64) -> Principal {
        Principal::member(MemberId::new(id).unwrap())
    }

    #[tokio::test]
    async fn issue_persists_refresh_token() {
        let (issuer, store) = issuer();
        let principal = member(1);

        let pair = issuer.issue(&principal, &RequestContext::new()).await.unwrap();

        assert!(store.validate(&principal.reference, &pair.refresh_token).await.unwrap());
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn pairs_issued_back_to_back_differ() {
        let (issuer, _) = issuer();
        let ctx = RequestContext::new();

        let first = issuer.issue(&member(1), &ctx).await.unwrap();
        let second = issuer.issue(&member(1), &ctx).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn rotated_refresh_token_cannot_be_replayed() {
        let (issuer, _) = issuer();
        let ctx = RequestContext::new();
        let original = issuer.issue(&member(1), &ctx).await.unwrap();

        let rotated = issuer.refresh(&original.refresh_token, &ctx).await.unwrap();

        assert_eq!(
            issuer.refresh(&original.refresh_token, &ctx).await,
            Err(AuthError::SessionInvalidated)
        );
        assert!(issuer.refresh(&rotated.refresh_token, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_refreshes_with_one_token_yield_one_pair() {
        let (issuer, store) = issuer();
        let issuer = Arc::new(issuer);
        let ctx = RequestContext::new();
        let original = issuer.issue(&member(1), &ctx).await.unwrap();

        let attempts = (0..6).map(|_| {
            let issuer = issuer.clone();
            let token = original.refresh_token.clone();
            tokio::spawn(async move { issuer.refresh(&token, &RequestContext::new()).await })
        });
        let results: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| *r == Err(AuthError::SessionInvalidated)));
        let live = store.find(&member(1).reference).await.unwrap();
        assert_eq!(live.as_deref(), Some(winners[0].refresh_token.as_str()));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let (issuer, _) = issuer();
        let pair = issuer.issue(&member(1), &RequestContext::new()).await.unwrap();

        let result = issuer.refresh(&pair.access_token, &RequestContext::new()).await;

        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn logout_is_final_and_idempotent() {
        let (issuer, _) = issuer();
        let ctx = RequestContext::new();
        let principal = member(3);
        let pair = issuer.issue(&principal, &ctx).await.unwrap();

        issuer.logout(&principal.reference, &ctx).await.unwrap();
        issuer.logout(&principal.reference, &ctx).await.unwrap();

        assert_eq!(
            issuer.refresh(&pair.refresh_token, &ctx).await,
            Err(AuthError::SessionInvalidated)
        );
    }

    #[tokio::test]
    async fn force_logout_revokes_admin_session_only() {
        let (issuer, _) = issuer();
        let ctx = RequestContext::new();
        let admin = Principal::admin(AdminId::new(1).unwrap());
        let admin_pair = issuer.issue(&admin, &ctx).await.unwrap();
        let member_pair = issuer.issue(&member(1), &ctx).await.unwrap();

        issuer.force_logout(&admin.reference, &ctx).await.unwrap();

        assert_eq!(
            issuer.refresh(&admin_pair.refresh_token, &ctx).await,
            Err(AuthError::SessionInvalidated)
        );
        assert!(issuer.refresh(&member_pair.refresh_token, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn authenticate_accepts_access_tokens_only() {
        let (issuer, _) = issuer();
        let principal = member(5);
        let pair = issuer.issue(&principal, &RequestContext::new()).await.unwrap();

        assert_eq!(issuer.authenticate(&pair.access_token).unwrap(), principal);
        assert_eq!(issuer.authenticate(&pair.refresh_token), Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_fails_issue_without_saving() {
        let signer = Arc::new(JwtTokenSigner::new(&SecretString::new("unit-test-secret".to_string())));
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let issuer = TokenIssuer::new(signer, store.clone(), TokenLifetimes::new(30, 1_000_000_000));

        let result = issuer.issue(&member(1), &RequestContext::new()).await;

        assert_eq!(result, Err(AuthError::LifetimeOutOfRange));
        assert!(store.is_empty().await);
    }

    #[test]
    fn lifetimes_saturate_instead_of_overflowing() {
        let lifetimes = TokenLifetimes::new(u64::MAX, u64::MAX);
        assert_eq!(lifetimes.access, Duration::from_secs(u64::MAX));
        assert_eq!(lifetimes.refresh, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn lifetimes_convert_minutes_and_days() {
        let lifetimes = TokenLifetimes::new(30, 14);
        assert_eq!(lifetimes.access, Duration::from_secs(1800));
        assert_eq!(lifetimes.refresh, Duration::from_secs(14 * 86_400));
    }
}
