//! In-memory member table.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::foundation::{MemberId, Timestamp};
use crate::domain::member::{Member, MemberError, NewMember, SnsType};
use crate::ports::MemberRepository;

/// Member rows in a vector. Like the production table it has no unique
/// constraint on `(sns_type, sns_id)`.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    members: RwLock<Vec<Member>>,
    next_id: AtomicI64,
    lookup_delay: Option<Duration>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slows lookups down to widen the find-then-insert race window.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub async fn count_by_sns(&self, sns_type: SnsType, sns_id: &str) -> usize {
        self.members
            .read()
            .await
            .iter()
            .filter(|m| m.sns_type == sns_type && m.sns_id == sns_id)
            .count()
    }

    pub async fn get(&self, id: MemberId) -> Option<Member> {
        self.members.read().await.iter().find(|m| m.id == id).cloned()
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find_by_sns(&self, sns_type: SnsType, sns_id: &str) -> Result<Option<Member>, MemberError> {
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .members
            .read()
            .await
            .iter()
            .find(|m| m.sns_type == sns_type && m.sns_id == sns_id)
            .cloned())
    }

    async fn insert(&self, member: NewMember) -> Result<Member, MemberError> {
        let raw_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = MemberId::new(raw_id)?;
        let row = Member {
            id,
            sns_type: member.sns_type,
            sns_id: member.sns_id,
            email: member.email,
            nickname: None,
            team_id: None,
            last_login_at: None,
            last_login_ip: None,
        };
        self.members.write().await.push(row.clone());
        Ok(row)
    }

    async fn record_login(&self, id: MemberId, at: Timestamp, ip: Option<String>) -> Result<(), MemberError> {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| MemberError::storage(format!("member {} not found", id)))?;
        member.last_login_at = Some(at);
        member.last_login_ip = ip;
        Ok(())
    }
}
