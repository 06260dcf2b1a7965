//! EventConsumer - Background service that drains a stream consumer group.
//!
//! ## Delivery
//!
//! Records are delivered at least once:
//! - A record whose handler succeeds (or deliberately skips it) is acked
//! - A record that fails is copied to the dead-letter stream, then acked
//! - If the dead-letter append fails too, the record stays pending and is
//!   re-read from this consumer's pending list after the next start
//!
//! Each record is processed on its own. A malformed payload, a handler
//! error or a handler panic affects only that record.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 1s | Fixed delay between poll cycles |
//! | `batch_size` | 10 | Max records read per cycle |
//! | `dead_letter_key` | `{stream}:dead-letter` | Where failed records go |
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and runs one final cycle
//! before stopping.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::stream::{EventProcessingError, StreamCoordinates, StreamEvent, StreamRecord};
use crate::ports::{EventStream, HandleOutcome, ReadPosition, StreamHandler};

/// Configuration for the EventConsumer service.
#[derive(Debug, Clone)]
pub struct EventConsumerConfig {
    /// Delay between poll cycles.
    pub poll_interval: Duration,

    /// Maximum records read per cycle.
    pub batch_size: usize,

    /// Stream receiving records that failed processing.
    pub dead_letter_key: String,
}

impl EventConsumerConfig {
    pub fn for_stream(stream_key: &str) -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
            dead_letter_key: format!("{}:dead-letter", stream_key),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_dead_letter_key(mut self, key: impl Into<String>) -> Self {
        self.dead_letter_key = key.into();
        self
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub read: usize,
    pub handled: usize,
    pub skipped: usize,
    pub dead_lettered: usize,
    pub left_pending: usize,
}

impl BatchReport {
    pub fn acked(&self) -> usize {
        self.handled + self.skipped + self.dead_lettered
    }

    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Handled => self.handled += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::DeadLettered => self.dead_lettered += 1,
            RecordOutcome::LeftPending => self.left_pending += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Handled,
    Skipped,
    DeadLettered,
    LeftPending,
}

/// Polls a consumer group and feeds every record to one handler.
pub struct EventConsumer {
    stream: Arc<dyn EventStream>,
    handler: Arc<dyn StreamHandler>,
    source: StreamCoordinates,
    config: EventConsumerConfig,
    group_ready: AtomicBool,
    /// Still re-reading records delivered to this consumer before a restart.
    recovering: AtomicBool,
}

impl EventConsumer {
    pub fn new(
        stream: Arc<dyn EventStream>,
        handler: Arc<dyn StreamHandler>,
        source: StreamCoordinates,
        config: EventConsumerConfig,
    ) -> Self {
        Self {
            stream,
            handler,
            source,
            config,
            group_ready: AtomicBool::new(false),
            recovering: AtomicBool::new(true),
        }
    }

    pub fn source(&self) -> &StreamCoordinates {
        &self.source
    }

    /// Run the poll loop until shutdown signal is received.
    ///
    /// Cycles never overlap: a slow cycle delays the next tick. A failed
    /// cycle is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            source = %self.source,
            handler = self.handler.name(),
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "Event consumer started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        // Shutdown requested - process one final batch then exit
                        self.cycle().await;
                        tracing::info!(source = %self.source, "Event consumer stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.cycle().await;
                }
            }
        }
    }

    async fn cycle(&self) {
        match self.poll_once().await {
            Ok(report) if report.read > 0 => {
                tracing::info!(
                    source = %self.source,
                    read = report.read,
                    handled = report.handled,
                    skipped = report.skipped,
                    dead_lettered = report.dead_lettered,
                    left_pending = report.left_pending,
                    "Processed stream batch"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(source = %self.source, error = %e, "Stream poll failed; retrying next cycle");
            }
        }
    }

    /// Run exactly one poll cycle.
    ///
    /// Only reading the stream can fail here; per-record failures are
    /// reported in the [`BatchReport`].
    pub async fn poll_once(&self) -> Result<BatchReport, EventProcessingError> {
        if !self.group_ready.load(Ordering::SeqCst) {
            self.stream.ensure_group(&self.source).await?;
            self.group_ready.store(true, Ordering::SeqCst);
        }

        if self.recovering.load(Ordering::SeqCst) {
            let pending = self
                .stream
                .read_group(&self.source, ReadPosition::Pending, self.config.batch_size)
                .await?;
            if !pending.is_empty() {
                tracing::info!(source = %self.source, count = pending.len(), "Reprocessing pending records");
                let report = self.process_records(&pending).await;
                if report.acked() == 0 {
                    // Nothing could be settled; move on to new records.
                    self.recovering.store(false, Ordering::SeqCst);
                }
                return Ok(report);
            }
            self.recovering.store(false, Ordering::SeqCst);
        }

        let records = self
            .stream
            .read_group(&self.source, ReadPosition::New, self.config.batch_size)
            .await?;
        Ok(self.process_records(&records).await)
    }

    async fn process_records(&self, records: &[StreamRecord]) -> BatchReport {
        let mut report = BatchReport {
            read: records.len(),
            ..BatchReport::default()
        };
        for record in records {
            report.record(self.process_record(record).await);
        }
        report
    }

    async fn process_record(&self, record: &StreamRecord) -> RecordOutcome {
        match self.handle(record).await {
            Ok(HandleOutcome::Handled) => self.ack(record, RecordOutcome::Handled).await,
            Ok(HandleOutcome::Skipped(reason)) => {
                tracing::info!(record_id = %record.id, reason = %reason, "Record skipped");
                self.ack(record, RecordOutcome::Skipped).await
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %record.id,
                    reason = e.reason(),
                    error = %e,
                    "Record processing failed"
                );
                match self.dead_letter(record, &e).await {
                    Ok(dead_letter_id) => {
                        tracing::info!(
                            record_id = %record.id,
                            dead_letter_id = %dead_letter_id,
                            dead_letter_key = %self.config.dead_letter_key,
                            "Record moved to dead letter stream"
                        );
                        self.ack(record, RecordOutcome::DeadLettered).await
                    }
                    Err(dl) => {
                        tracing::error!(
                            record_id = %record.id,
                            error = %dl,
                            "Dead letter append failed; leaving record pending"
                        );
                        RecordOutcome::LeftPending
                    }
                }
            }
        }
    }

    /// Decodes and dispatches one record. A panicking handler counts as a
    /// handler failure.
    async fn handle(&self, record: &StreamRecord) -> Result<HandleOutcome, EventProcessingError> {
        let event = StreamEvent::decode(&self.source, record)?;
        match AssertUnwindSafe(self.handler.handle(&event)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(EventProcessingError::handler(format!("{} panicked", self.handler.name()))),
        }
    }

    async fn ack(&self, record: &StreamRecord, outcome: RecordOutcome) -> RecordOutcome {
        match self.stream.ack(&self.source, std::slice::from_ref(&record.id)).await {
            Ok(_) => outcome,
            Err(e) => {
                tracing::error!(record_id = %record.id, error = %e, "Ack failed; record stays pending");
                RecordOutcome::LeftPending
            }
        }
    }

    async fn dead_letter(&self, record: &StreamRecord, error: &EventProcessingError) -> Result<String, EventProcessingError> {
        let fields = [
            ("source_id".to_string(), record.id.clone()),
            ("reason".to_string(), error.reason().to_string()),
            ("error".to_string(), error.to_string()),
            ("payload".to_string(), record.raw_payload().unwrap_or_default().to_string()),
        ];
        self.stream.append(&self.config.dead_letter_key, &fields).await
    }
}

impl std::fmt::Debug for EventConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConsumer")
            .field("source", &self.source)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
