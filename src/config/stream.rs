//! Event stream configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::stream::StreamCoordinates;

use super::error::ValidationError;

/// Upper bound on records read per poll.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Where the push consumer reads from and how it paces itself
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Stream key
    pub key: String,

    /// Consumer group name
    pub group: String,

    /// Consumer name within the group; keep it stable across restarts so
    /// pending records are recovered
    pub consumer: String,

    /// Delay between polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum records read per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Dead-letter stream; `<key>:dead-letter` when unset
    pub dead_letter_key: Option<String>,

    /// How long processed-record markers are kept, in seconds
    #[serde(default = "default_processed_ttl_secs")]
    pub processed_ttl_secs: u64,
}

impl StreamConfig {
    pub fn coordinates(&self) -> StreamCoordinates {
        StreamCoordinates {
            stream_key: self.key.clone(),
            group: self.group.clone(),
            consumer: self.consumer.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn processed_ttl(&self) -> Duration {
        Duration::from_secs(self.processed_ttl_secs)
    }

    pub fn dead_letter_key(&self) -> String {
        self.dead_letter_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| format!("{}:dead-letter", self.key))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("STREAM__KEY"));
        }
        if self.group.trim().is_empty() {
            return Err(ValidationError::MissingRequired("STREAM__GROUP"));
        }
        if self.consumer.trim().is_empty() {
            return Err(ValidationError::MissingRequired("STREAM__CONSUMER"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ValidationError::InvalidBatchSize { max: MAX_BATCH_SIZE });
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            group: String::new(),
            consumer: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            dead_letter_key: None,
            processed_ttl_secs: default_processed_ttl_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    10
}

fn default_processed_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}
