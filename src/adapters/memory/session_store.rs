//! In-memory refresh-token store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::auth::{AuthError, PrincipalRef};
use crate::ports::{tokens_match, RefreshTokenStore};

/// Session map keyed by principal, with lazy expiry.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    sessions: RwLock<HashMap<PrincipalRef, (String, Instant)>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, principal: &PrincipalRef, token: &str, ttl: Duration) -> Result<(), AuthError> {
        self.sessions
            .write()
            .await
            .insert(*principal, (token.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn find(&self, principal: &PrincipalRef) -> Result<Option<String>, AuthError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(principal)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(token, _)| token.clone()))
    }

    async fn delete(&self, principal: &PrincipalRef) -> Result<(), AuthError> {
        self.sessions.write().await.remove(principal);
        Ok(())
    }

    async fn rotate(
        &self,
        principal: &PrincipalRef,
        presented: &str,
        new_token: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let current = sessions
            .get(principal)
            .is_some_and(|(token, expires_at)| *expires_at > now && tokens_match(token, presented));
        if current {
            sessions.insert(*principal, (new_token.to_string(), now + ttl));
        }
        Ok(current)
    }
}
