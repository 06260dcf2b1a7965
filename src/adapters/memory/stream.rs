//! In-memory stream with consumer groups.
//!
//! Mirrors the parts of Redis stream semantics the consumer relies on:
//! new reads deliver each record to one consumer of a group, delivered
//! records stay pending until acked, and a pending read returns only the
//! calling consumer's own entries.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::domain::stream::{EventProcessingError, StreamCoordinates, StreamRecord};
use crate::ports::{EventStream, ReadPosition};

#[derive(Debug, Default)]
struct Group {
    /// Number of entries already handed out by `>` reads.
    delivered: usize,
    /// Record id to owning consumer.
    pending: BTreeMap<u64, String>,
}

#[derive(Debug, Default)]
struct Stream {
    entries: Vec<(u64, HashMap<String, String>)>,
    groups: HashMap<String, Group>,
}

/// Stream store for tests and single-node runs.
#[derive(Debug, Default)]
pub struct InMemoryEventStream {
    streams: Mutex<HashMap<String, Stream>>,
    sequence: AtomicU64,
    unavailable: AtomicBool,
    reject_appends: AtomicBool,
}

fn record_id(seq: u64) -> String {
    format!("{}-0", seq)
}

fn parse_record_id(id: &str) -> Option<u64> {
    id.split('-').next()?.parse().ok()
}

impl InMemoryEventStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes appends fail while reads and acks keep working.
    pub fn set_reject_appends(&self, reject: bool) {
        self.reject_appends.store(reject, Ordering::SeqCst);
    }

    /// Producer helper: appends a record with a `payload` field.
    pub async fn publish(&self, stream_key: &str, payload: &str) -> Result<String, EventProcessingError> {
        self.append(stream_key, &[("payload".to_string(), payload.to_string())])
            .await
    }

    /// All records of a stream, in append order.
    pub async fn records(&self, stream_key: &str) -> Vec<StreamRecord> {
        let streams = self.streams.lock().await;
        streams
            .get(stream_key)
            .map(|s| {
                s.entries
                    .iter()
                    .map(|(seq, fields)| StreamRecord::new(record_id(*seq), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Delivered but unacked records of a group.
    pub async fn pending_count(&self, stream_key: &str, group: &str) -> usize {
        let streams = self.streams.lock().await;
        streams
            .get(stream_key)
            .and_then(|s| s.groups.get(group))
            .map(|g| g.pending.len())
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), EventProcessingError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EventProcessingError::unavailable("stream store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStream for InMemoryEventStream {
    async fn ensure_group(&self, source: &StreamCoordinates) -> Result<(), EventProcessingError> {
        self.check_available()?;
        let mut streams = self.streams.lock().await;
        let stream = streams.entry(source.stream_key.clone()).or_default();
        // New groups start at `0`: records appended before creation are still delivered.
        stream.groups.entry(source.group.clone()).or_default();
        Ok(())
    }

    async fn read_group(
        &self,
        source: &StreamCoordinates,
        position: ReadPosition,
        count: usize,
    ) -> Result<Vec<StreamRecord>, EventProcessingError> {
        self.check_available()?;
        let mut streams = self.streams.lock().await;
        let stream = streams
            .get_mut(&source.stream_key)
            .ok_or_else(|| EventProcessingError::unavailable(format!("no such stream {}", source.stream_key)))?;
        let group = stream
            .groups
            .get_mut(&source.group)
            .ok_or_else(|| EventProcessingError::unavailable(format!("no such group {}", source.group)))?;

        let records = match position {
            ReadPosition::Pending => {
                let mine: Vec<u64> = group
                    .pending
                    .iter()
                    .filter(|(_, consumer)| **consumer == source.consumer)
                    .map(|(seq, _)| *seq)
                    .take(count)
                    .collect();
                stream
                    .entries
                    .iter()
                    .filter(|(seq, _)| mine.contains(seq))
                    .map(|(seq, fields)| StreamRecord::new(record_id(*seq), fields.clone()))
                    .collect()
            }
            ReadPosition::New => {
                let start = group.delivered;
                let end = (start + count).min(stream.entries.len());
                let mut out = Vec::with_capacity(end - start);
                for (seq, fields) in &stream.entries[start..end] {
                    group.pending.insert(*seq, source.consumer.clone());
                    out.push(StreamRecord::new(record_id(*seq), fields.clone()));
                }
                group.delivered = end;
                out
            }
        };

        Ok(records)
    }

    async fn ack(&self, source: &StreamCoordinates, record_ids: &[String]) -> Result<u64, EventProcessingError> {
        self.check_available()?;
        let mut streams = self.streams.lock().await;
        let Some(group) = streams
            .get_mut(&source.stream_key)
            .and_then(|s| s.groups.get_mut(&source.group))
        else {
            return Ok(0);
        };

        let acked = record_ids
            .iter()
            .filter_map(|id| parse_record_id(id))
            .filter(|seq| group.pending.remove(seq).is_some())
            .count();
        Ok(acked as u64)
    }

    async fn append(&self, stream_key: &str, fields: &[(String, String)]) -> Result<String, EventProcessingError> {
        self.check_available()?;
        if self.reject_appends.load(Ordering::SeqCst) {
            return Err(EventProcessingError::unavailable("append rejected"));
        }
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut streams = self.streams.lock().await;
        streams
            .entry(stream_key.to_string())
            .or_default()
            .entries
            .push((seq, fields.iter().cloned().collect()));
        Ok(record_id(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(consumer: &str) -> StreamCoordinates {
        StreamCoordinates {
            stream_key: "push".to_string(),
            group: "g".to_string(),
            consumer: consumer.to_string(),
        }
    }

    #[tokio::test]
    async fn new_reads_deliver_each_record_once_per_group() {
        let stream = InMemoryEventStream::new();
        stream.ensure_group(&source("a")).await.unwrap();
        stream.publish("push", "{}").await.unwrap();
        stream.publish("push", "{}").await.unwrap();

        let first = stream.read_group(&source("a"), ReadPosition::New, 10).await.unwrap();
        let second = stream.read_group(&source("b"), ReadPosition::New, 10).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(stream.pending_count("push", "g").await, 2);
    }

    #[tokio::test]
    async fn pending_reads_return_only_own_unacked_records() {
        let stream = InMemoryEventStream::new();
        stream.ensure_group(&source("a")).await.unwrap();
        let id = stream.publish("push", "{}").await.unwrap();
        stream.read_group(&source("a"), ReadPosition::New, 10).await.unwrap();

        assert_eq!(stream.read_group(&source("a"), ReadPosition::Pending, 10).await.unwrap().len(), 1);
        assert!(stream.read_group(&source("b"), ReadPosition::Pending, 10).await.unwrap().is_empty());

        assert_eq!(stream.ack(&source("a"), &[id]).await.unwrap(), 1);
        assert!(stream.read_group(&source("a"), ReadPosition::Pending, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_group_is_idempotent_and_starts_at_head() {
        let stream = InMemoryEventStream::new();
        stream.publish("push", "{\"early\":true}").await.unwrap();
        stream.ensure_group(&source("a")).await.unwrap();
        stream.read_group(&source("a"), ReadPosition::New, 10).await.unwrap();
        stream.ensure_group(&source("a")).await.unwrap();

        assert_eq!(stream.pending_count("push", "g").await, 1);
        assert!(stream.read_group(&source("a"), ReadPosition::New, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_size_limits_new_reads() {
        let stream = InMemoryEventStream::new();
        stream.ensure_group(&source("a")).await.unwrap();
        for _ in 0..5 {
            stream.publish("push", "{}").await.unwrap();
        }

        assert_eq!(stream.read_group(&source("a"), ReadPosition::New, 2).await.unwrap().len(), 2);
        assert_eq!(stream.read_group(&source("a"), ReadPosition::New, 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let stream = InMemoryEventStream::new();
        stream.ensure_group(&source("a")).await.unwrap();
        stream.set_unavailable(true);

        let result = stream.read_group(&source("a"), ReadPosition::New, 10).await;
        assert!(matches!(result, Err(EventProcessingError::Unavailable(_))));
    }
}
