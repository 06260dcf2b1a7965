//! Redis-backed refresh-token store.
//!
//! One string key per principal (`refresh_token:{id}` or
//! `admin_refresh_token:{id}`) holding the live token with a PX expiry.
//! Rotation is a compare-and-set script so a token can be spent once.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use std::time::Duration;

use crate::domain::auth::{AuthError, PrincipalRef};
use crate::ports::RefreshTokenStore;

/// KEYS[1] session key; ARGV[1] presented token, ARGV[2] new token, ARGV[3] ttl ms.
const ROTATE_IF_CURRENT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  redis.call('SET', KEYS[1], ARGV[2], 'PX', ARGV[3])
  return 1
end
return 0
"#;

#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    conn: MultiplexedConnection,
    rotate_if_current: Script,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            rotate_if_current: Script::new(ROTATE_IF_CURRENT),
        }
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn save(&self, principal: &PrincipalRef, token: &str, ttl: Duration) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(principal.session_key())
            .arg(token)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e: redis::RedisError| AuthError::ServiceUnavailable(e.to_string()))
    }

    async fn find(&self, principal: &PrincipalRef) -> Result<Option<String>, AuthError> {
        let mut conn = self.conn.clone();
        conn.get(principal.session_key())
            .await
            .map_err(|e: redis::RedisError| AuthError::ServiceUnavailable(e.to_string()))
    }

    async fn delete(&self, principal: &PrincipalRef) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(principal.session_key())
            .await
            .map_err(|e: redis::RedisError| AuthError::ServiceUnavailable(e.to_string()))
    }

    async fn rotate(
        &self,
        principal: &PrincipalRef,
        presented: &str,
        new_token: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError> {
        let mut conn = self.conn.clone();
        let swapped: i64 = self
            .rotate_if_current
            .prepare_invoke()
            .key(principal.session_key())
            .arg(presented)
            .arg(new_token)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| AuthError::ServiceUnavailable(e.to_string()))?;
        Ok(swapped == 1)
    }
}

impl std::fmt::Debug for RedisRefreshTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRefreshTokenStore").finish_non_exhaustive()
    }
}
