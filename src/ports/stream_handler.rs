//! StreamHandler port - business handling of one decoded stream event.

use async_trait::async_trait;

use crate::domain::stream::{EventProcessingError, StreamEvent};

/// What a handler did with an event it did not reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The event took effect.
    Handled,
    /// Nothing to do for this event; it is acked like a handled one.
    Skipped(String),
}

impl HandleOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        HandleOutcome::Skipped(reason.into())
    }
}

/// Handler invoked by the `EventConsumer` for every record.
///
/// Handlers must tolerate redelivery; wrap them in `IdempotentHandler` when
/// a repeated side effect is visible to users.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    async fn handle(&self, event: &StreamEvent) -> Result<HandleOutcome, EventProcessingError>;

    /// Stable name used for idempotency markers and log fields.
    fn name(&self) -> &'static str;
}
