//! Redis-backed processed-record markers.
//!
//! Markers expire after a TTL; they only need to outlive the window in
//! which a record can be redelivered.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::stream::EventProcessingError;
use crate::ports::{processed_event_key, ProcessedEventStore};

#[derive(Clone)]
pub struct RedisProcessedEventStore {
    conn: MultiplexedConnection,
    ttl: Duration,
}

impl RedisProcessedEventStore {
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self { conn, ttl }
    }
}

#[async_trait]
impl ProcessedEventStore for RedisProcessedEventStore {
    async fn contains(&self, record_id: &str, handler_name: &str) -> Result<bool, EventProcessingError> {
        let mut conn = self.conn.clone();
        conn.exists(processed_event_key(handler_name, record_id))
            .await
            .map_err(|e: redis::RedisError| EventProcessingError::Unavailable(e.to_string()))
    }

    async fn mark_processed(&self, record_id: &str, handler_name: &str) -> Result<(), EventProcessingError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(processed_event_key(handler_name, record_id))
            .arg(1)
            .arg("PX")
            .arg((self.ttl.as_millis() as u64).max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e: redis::RedisError| EventProcessingError::Unavailable(e.to_string()))
    }
}

impl std::fmt::Debug for RedisProcessedEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisProcessedEventStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
