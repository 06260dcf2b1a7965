//! ProcessedEventStore port - Interface for tracking processed records.
//!
//! This port enables idempotent stream handling by tracking which records
//! have been processed by which handlers. A record is redelivered when the
//! process stops between handling it and acking it.

use async_trait::async_trait;

use crate::domain::stream::EventProcessingError;

/// Port for tracking which records have been processed by which handlers.
///
/// Each handler has its own processing record, allowing different handlers
/// to process the same record independently.
///
/// # Example
///
/// ```ignore
/// if store.contains(&event.record_id, "PushNotificationHandler").await? {
///     return Ok(HandleOutcome::skipped("already processed"));
/// }
///
/// // Process event...
///
/// store.mark_processed(&event.record_id, "PushNotificationHandler").await?;
/// ```
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Returns `true` if the record has already been processed by this handler.
    async fn contains(&self, record_id: &str, handler_name: &str) -> Result<bool, EventProcessingError>;

    /// Mark a record as processed by a specific handler.
    ///
    /// Called AFTER successful handling so a failed record is retried.
    async fn mark_processed(&self, record_id: &str, handler_name: &str) -> Result<(), EventProcessingError>;
}

/// Key under which a marker is stored.
pub fn processed_event_key(handler_name: &str, record_id: &str) -> String {
    format!("processed_event:{}:{}", handler_name, record_id)
}
