//! IdempotentHandler - Wrapper for ensuring at-most-once record processing.
//!
//! This decorator wraps any `StreamHandler` and uses a `ProcessedEventStore`
//! to ensure each stream record is processed at most once per handler.
//!
//! ## Usage
//!
//! ```ignore
//! let handler = IdempotentHandler::new(
//!     PushNotificationHandler::new(audience, dispatcher),
//!     processed_event_store.clone(),
//! );
//! ```
//!
//! ## How It Works
//!
//! 1. Before processing: Check if the record id was already processed
//! 2. If already processed: Skip
//! 3. If not processed: Delegate to inner handler
//! 4. After successful handling: Mark record as processed
//!
//! A failed or skipped record is not marked, so it can be retried. A marker
//! write that fails after handling is logged and the record still counts as
//! handled, since its side effect already happened.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::stream::{EventProcessingError, StreamEvent};
use crate::ports::{HandleOutcome, ProcessedEventStore, StreamHandler};

/// Decorates any `StreamHandler` with idempotency tracking.
/// Uses the handler's `name()` as the idempotency scope.
pub struct IdempotentHandler<H: StreamHandler> {
    inner: H,
    processed_events: Arc<dyn ProcessedEventStore>,
}

impl<H: StreamHandler> IdempotentHandler<H> {
    pub fn new(inner: H, processed_events: Arc<dyn ProcessedEventStore>) -> Self {
        Self {
            inner,
            processed_events,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: StreamHandler + 'static> StreamHandler for IdempotentHandler<H> {
    async fn handle(&self, event: &StreamEvent) -> Result<HandleOutcome, EventProcessingError> {
        let handler_name = self.inner.name();

        if self
            .processed_events
            .contains(&event.record_id, handler_name)
            .await?
        {
            tracing::debug!(record_id = %event.record_id, handler = handler_name, "Skipping duplicate record");
            return Ok(HandleOutcome::skipped("already processed"));
        }

        let outcome = self.inner.handle(event).await?;

        if outcome == HandleOutcome::Handled {
            if let Err(e) = self
                .processed_events
                .mark_processed(&event.record_id, handler_name)
                .await
            {
                tracing::warn!(
                    record_id = %event.record_id,
                    handler = handler_name,
                    error = %e,
                    "Handled record could not be marked processed; a redelivery may repeat it"
                );
            }
        }

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryProcessedEventStore;
    use crate::domain::stream::{StreamCoordinates, StreamRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test handler that counts invocations
    struct CountingHandler {
        count: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                count: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn invocations(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamHandler for CountingHandler {
        async fn handle(&self, _: &StreamEvent) -> Result<HandleOutcome, EventProcessingError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EventProcessingError::handler("Handler failed"));
            }
            Ok(HandleOutcome::Handled)
        }

        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    /// Store whose reads succeed and whose marker writes always fail.
    struct UnwritableProcessedEventStore;

    #[async_trait]
    impl ProcessedEventStore for UnwritableProcessedEventStore {
        async fn contains(&self, _: &str, _: &str) -> Result<bool, EventProcessingError> {
            Ok(false)
        }

        async fn mark_processed(&self, _: &str, _: &str) -> Result<(), EventProcessingError> {
            Err(EventProcessingError::unavailable("connection reset"))
        }
    }

    fn test_event(record_id: &str) -> StreamEvent {
        let source = StreamCoordinates {
            stream_key: "s".to_string(),
            group: "g".to_string(),
            consumer: "c".to_string(),
        };
        StreamEvent::decode(&source, &StreamRecord::with_payload(record_id, "{}")).unwrap()
    }

    #[tokio::test]
    async fn first_record_is_processed() {
        let handler = IdempotentHandler::new(CountingHandler::new(), Arc::new(InMemoryProcessedEventStore::new()));

        let outcome = handler.handle(&test_event("1-0")).await.unwrap();

        assert_eq!(outcome, HandleOutcome::Handled);
        assert_eq!(handler.inner().invocations(), 1);
    }

    #[tokio::test]
    async fn duplicate_record_is_skipped() {
        let handler = IdempotentHandler::new(CountingHandler::new(), Arc::new(InMemoryProcessedEventStore::new()));
        let event = test_event("2-0");

        handler.handle(&event).await.unwrap();
        let second = handler.handle(&event).await.unwrap();

        assert!(matches!(second, HandleOutcome::Skipped(_)));
        assert_eq!(handler.inner().invocations(), 1);
    }

    #[tokio::test]
    async fn failed_record_is_not_marked() {
        let store = Arc::new(InMemoryProcessedEventStore::new());
        let handler = IdempotentHandler::new(CountingHandler::failing(), store.clone());
        let event = test_event("3-0");

        assert!(handler.handle(&event).await.is_err());
        assert!(handler.handle(&event).await.is_err());

        assert_eq!(handler.inner().invocations(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn marker_write_failure_still_reports_handled() {
        let handler = IdempotentHandler::new(CountingHandler::new(), Arc::new(UnwritableProcessedEventStore));

        let outcome = handler.handle(&test_event("4-0")).await;

        assert_eq!(outcome, Ok(HandleOutcome::Handled));
        assert_eq!(handler.inner().invocations(), 1);
    }

    #[tokio::test]
    async fn name_delegates_to_inner() {
        let handler = IdempotentHandler::new(CountingHandler::new(), Arc::new(InMemoryProcessedEventStore::new()));
        assert_eq!(handler.name(), "CountingHandler");
    }
}
