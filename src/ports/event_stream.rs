//! EventStream port - consumer-group access to an append-only stream.

use async_trait::async_trait;

use crate::domain::stream::{EventProcessingError, StreamCoordinates, StreamRecord};

/// Which records a group read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPosition {
    /// Records already delivered to this consumer but never acked (`0`).
    Pending,
    /// Records never delivered to any consumer of the group (`>`).
    New,
}

impl ReadPosition {
    /// Id argument of `XREADGROUP`.
    pub fn as_stream_id(&self) -> &'static str {
        match self {
            ReadPosition::Pending => "0",
            ReadPosition::New => ">",
        }
    }
}

/// Port for reading a stream through a consumer group.
///
/// Failures are reported as `EventProcessingError::Unavailable`.
#[async_trait]
pub trait EventStream: Send + Sync {
    /// Creates the group (and the stream) if missing. Idempotent.
    async fn ensure_group(&self, source: &StreamCoordinates) -> Result<(), EventProcessingError>;

    /// Reads up to `count` records for this consumer.
    async fn read_group(
        &self,
        source: &StreamCoordinates,
        position: ReadPosition,
        count: usize,
    ) -> Result<Vec<StreamRecord>, EventProcessingError>;

    /// Acknowledges records so they leave the pending list.
    async fn ack(&self, source: &StreamCoordinates, record_ids: &[String]) -> Result<u64, EventProcessingError>;

    /// Appends a record and returns its id.
    async fn append(&self, stream_key: &str, fields: &[(String, String)]) -> Result<String, EventProcessingError>;
}
