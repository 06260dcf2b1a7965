//! Redis-backed distributed lock.
//!
//! Each key holds the owner token of its holder with a PX expiry:
//!
//! 1. A single key is taken with `SET key token NX PX lease`
//! 2. A composite set is taken by a script that checks every key and only
//!    then writes all of them, so a partial acquisition is never visible
//! 3. Release and renewal are compare-and-act scripts keyed on the token,
//!    so a holder whose lease lapsed cannot touch its successor's lock

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::lock::{LockError, LockKeys};
use crate::ports::{DistributedLock, HeldLock, LockOwnership};

const ACQUIRE_ALL: &str = r#"
for _, key in ipairs(KEYS) do
  if redis.call('EXISTS', key) == 1 then
    return 0
  end
end
for _, key in ipairs(KEYS) do
  redis.call('SET', key, ARGV[1], 'PX', ARGV[2])
end
return 1
"#;

const RELEASE_OWNED: &str = r#"
local released = 0
for _, key in ipairs(KEYS) do
  if redis.call('GET', key) == ARGV[1] then
    redis.call('DEL', key)
    released = released + 1
  end
end
return released
"#;

const RENEW_OWNED: &str = r#"
local renewed = 0
for _, key in ipairs(KEYS) do
  if redis.call('GET', key) == ARGV[1] then
    redis.call('PEXPIRE', key, ARGV[2])
    renewed = renewed + 1
  end
end
return renewed
"#;

/// Lock store shared by every process connected to the same Redis.
#[derive(Clone)]
pub struct RedisDistributedLock {
    conn: MultiplexedConnection,
    acquire_all: Script,
    release_owned: Script,
    renew_owned: Script,
}

impl RedisDistributedLock {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            acquire_all: Script::new(ACQUIRE_ALL),
            release_owned: Script::new(RELEASE_OWNED),
            renew_owned: Script::new(RENEW_OWNED),
        }
    }

    async fn run_keyed(&self, script: &Script, keys: &LockKeys, token: &str, millis: Option<u64>) -> Result<i64, LockError> {
        let mut invocation = script.prepare_invoke();
        for key in keys.iter() {
            invocation.key(key.as_str());
        }
        invocation.arg(token);
        if let Some(ms) = millis {
            invocation.arg(ms);
        }

        let mut conn = self.conn.clone();
        invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| LockError::Unavailable(e.to_string()))
    }
}

fn lease_millis(lease: Duration) -> u64 {
    (lease.as_millis() as u64).max(1)
}

#[async_trait]
impl DistributedLock for RedisDistributedLock {
    async fn try_acquire(&self, keys: &LockKeys, lease: Duration) -> Result<Option<HeldLock>, LockError> {
        let token = Uuid::new_v4().to_string();
        let ms = lease_millis(lease);

        let acquired = if keys.is_composite() {
            self.run_keyed(&self.acquire_all, keys, &token, Some(ms)).await? == 1
        } else {
            let mut conn = self.conn.clone();
            let reply: Option<String> = redis::cmd("SET")
                .arg(keys.primary().as_str())
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(ms)
                .query_async(&mut conn)
                .await
                .map_err(|e: redis::RedisError| LockError::Unavailable(e.to_string()))?;
            reply.is_some()
        };

        Ok(acquired.then(|| HeldLock::new(LockOwnership::new(keys.clone(), token))))
    }

    async fn release(&self, lock: HeldLock) -> Result<bool, LockError> {
        let ownership = lock.ownership();
        let released = self
            .run_keyed(&self.release_owned, ownership.keys(), ownership.token(), None)
            .await?;
        Ok(released as usize == ownership.keys().len())
    }

    async fn renew(&self, ownership: &LockOwnership, lease: Duration) -> Result<bool, LockError> {
        let renewed = self
            .run_keyed(&self.renew_owned, ownership.keys(), ownership.token(), Some(lease_millis(lease)))
            .await?;
        Ok(renewed as usize == ownership.keys().len())
    }
}

impl std::fmt::Debug for RedisDistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDistributedLock").finish_non_exhaustive()
    }
}
