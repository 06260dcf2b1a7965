//! Redis Streams consumer-group adapter.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;

use crate::domain::stream::{EventProcessingError, StreamCoordinates, StreamRecord};
use crate::ports::{EventStream, ReadPosition};

#[derive(Clone)]
pub struct RedisEventStream {
    conn: MultiplexedConnection,
}

impl RedisEventStream {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

fn unavailable(e: redis::RedisError) -> EventProcessingError {
    EventProcessingError::Unavailable(e.to_string())
}

/// Flattens a stream reply into records, skipping non-string field values.
fn into_records(reply: StreamReadReply) -> Vec<StreamRecord> {
    reply
        .keys
        .into_iter()
        .flat_map(|key| key.ids)
        .map(|entry| {
            let fields: HashMap<String, String> = entry
                .map
                .iter()
                .filter_map(|(field, value)| {
                    redis::from_redis_value::<String>(value)
                        .ok()
                        .map(|v| (field.clone(), v))
                })
                .collect();
            StreamRecord::new(entry.id, fields)
        })
        .collect()
}

#[async_trait]
impl EventStream for RedisEventStream {
    async fn ensure_group(&self, source: &StreamCoordinates) -> Result<(), EventProcessingError> {
        let mut conn = self.conn.clone();
        let created: Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(&source.stream_key, &source.group, "0")
            .await;

        match created {
            Ok(()) => {
                tracing::info!(stream = %source.stream_key, group = %source.group, "Created consumer group");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn read_group(
        &self,
        source: &StreamCoordinates,
        position: ReadPosition,
        count: usize,
    ) -> Result<Vec<StreamRecord>, EventProcessingError> {
        let options = StreamReadOptions::default()
            .group(&source.group, &source.consumer)
            .count(count);

        let mut conn = self.conn.clone();
        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&source.stream_key], &[position.as_stream_id()], &options)
            .await
            .map_err(unavailable)?;

        Ok(reply.map(into_records).unwrap_or_default())
    }

    async fn ack(&self, source: &StreamCoordinates, record_ids: &[String]) -> Result<u64, EventProcessingError> {
        if record_ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let acked: u64 = conn
            .xack(&source.stream_key, &source.group, record_ids)
            .await
            .map_err(unavailable)?;
        Ok(acked)
    }

    async fn append(&self, stream_key: &str, fields: &[(String, String)]) -> Result<String, EventProcessingError> {
        let mut conn = self.conn.clone();
        conn.xadd(stream_key, "*", fields).await.map_err(unavailable)
    }
}

impl std::fmt::Debug for RedisEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEventStream").finish_non_exhaustive()
    }
}
