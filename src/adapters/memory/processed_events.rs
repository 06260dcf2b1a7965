//! In-memory processed-record markers.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::domain::stream::EventProcessingError;
use crate::ports::{processed_event_key, ProcessedEventStore};

/// Marker set for tests. Markers never expire.
#[derive(Debug, Default)]
pub struct InMemoryProcessedEventStore {
    processed: RwLock<HashSet<String>>,
}

impl InMemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.processed.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryProcessedEventStore {
    async fn contains(&self, record_id: &str, handler_name: &str) -> Result<bool, EventProcessingError> {
        let key = processed_event_key(handler_name, record_id);
        Ok(self.processed.read().await.contains(&key))
    }

    async fn mark_processed(&self, record_id: &str, handler_name: &str) -> Result<(), EventProcessingError> {
        let key = processed_event_key(handler_name, record_id);
        self.processed.write().await.insert(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contains_returns_false_for_new_record() {
        let store = InMemoryProcessedEventStore::new();
        assert!(!store.contains("1-0", "TestHandler").await.unwrap());
    }

    #[tokio::test]
    async fn different_handlers_track_separately() {
        let store = InMemoryProcessedEventStore::new();

        store.mark_processed("1-0", "HandlerA").await.unwrap();

        assert!(store.contains("1-0", "HandlerA").await.unwrap());
        assert!(!store.contains("1-0", "HandlerB").await.unwrap());
    }

    #[tokio::test]
    async fn mark_processed_is_idempotent() {
        let store = InMemoryProcessedEventStore::new();

        store.mark_processed("2-0", "TestHandler").await.unwrap();
        store.mark_processed("2-0", "TestHandler").await.unwrap();

        assert_eq!(store.len().await, 1);
    }
}
