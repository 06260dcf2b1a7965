//! Push ports - who to notify and how to deliver.

use async_trait::async_trait;

use crate::domain::foundation::TeamId;
use crate::domain::push::{Notification, Team};
use crate::domain::stream::EventProcessingError;

/// Read access to teams and the device tokens of their supporters.
#[async_trait]
pub trait PushAudience: Send + Sync {
    async fn team(&self, id: TeamId) -> Result<Option<Team>, EventProcessingError>;

    /// Device tokens of members supporting any of `teams`. May contain blanks.
    async fn device_tokens_for_teams(&self, teams: &[TeamId]) -> Result<Vec<String>, EventProcessingError>;
}

/// External push transport.
#[async_trait]
pub trait PushDispatcher: Send + Sync {
    /// Sends one notification to every token. `Ok(false)` means the
    /// transport rejected the batch.
    async fn send(&self, tokens: &[String], notification: &Notification) -> Result<bool, EventProcessingError>;
}
