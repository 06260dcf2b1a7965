//! Push transport adapters.
//!
//! The real transport is an external service; `RecordingPushDispatcher`
//! stands in for it in tests and local runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::push::Notification;
use crate::domain::stream::EventProcessingError;
use crate::ports::PushDispatcher;

/// One recorded `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub tokens: Vec<String>,
    pub notification: Notification,
}

/// Dispatcher that records every call and answers with a fixed result.
#[derive(Debug)]
pub struct RecordingPushDispatcher {
    sent: RwLock<Vec<SentPush>>,
    accept: AtomicBool,
}

impl Default for RecordingPushDispatcher {
    fn default() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            accept: AtomicBool::new(true),
        }
    }
}

impl RecordingPushDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher whose transport rejects every batch.
    pub fn rejecting() -> Self {
        let dispatcher = Self::default();
        dispatcher.set_accept(false);
        dispatcher
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentPush> {
        self.sent.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait]
impl PushDispatcher for RecordingPushDispatcher {
    async fn send(&self, tokens: &[String], notification: &Notification) -> Result<bool, EventProcessingError> {
        self.sent.write().await.push(SentPush {
            tokens: tokens.to_vec(),
            notification: notification.clone(),
        });
        Ok(self.accept.load(Ordering::SeqCst))
    }
}
