//! In-memory teams and supporter device tokens.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::TeamId;
use crate::domain::push::Team;
use crate::domain::stream::EventProcessingError;
use crate::ports::PushAudience;

#[derive(Debug, Default)]
pub struct InMemoryPushAudience {
    teams: RwLock<HashMap<TeamId, Team>>,
    /// (supported team, device token)
    supporters: RwLock<Vec<(TeamId, String)>>,
}

impl InMemoryPushAudience {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_team(&self, id: TeamId, name: impl Into<String>) {
        self.teams.write().await.insert(id, Team { id, name: name.into() });
    }

    pub async fn add_supporter(&self, team: TeamId, device_token: impl Into<String>) {
        self.supporters.write().await.push((team, device_token.into()));
    }
}

#[async_trait]
impl PushAudience for InMemoryPushAudience {
    async fn team(&self, id: TeamId) -> Result<Option<Team>, EventProcessingError> {
        Ok(self.teams.read().await.get(&id).cloned())
    }

    async fn device_tokens_for_teams(&self, teams: &[TeamId]) -> Result<Vec<String>, EventProcessingError> {
        Ok(self
            .supporters
            .read()
            .await
            .iter()
            .filter(|(team, _)| teams.contains(team))
            .map(|(_, token)| token.clone())
            .collect())
    }
}
