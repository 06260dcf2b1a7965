//! MemberRepository port - member rows touched by the login flow.

use async_trait::async_trait;

use crate::domain::foundation::{MemberId, Timestamp};
use crate::domain::member::{Member, MemberError, NewMember, SnsType};

/// Persistence for members.
///
/// Implementations are not required to enforce uniqueness of
/// `(sns_type, sns_id)`; sign-up is serialized with a `MEMBER_REGISTER` lock.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_sns(&self, sns_type: SnsType, sns_id: &str) -> Result<Option<Member>, MemberError>;

    async fn insert(&self, member: NewMember) -> Result<Member, MemberError>;

    async fn record_login(&self, id: MemberId, at: Timestamp, ip: Option<String>) -> Result<(), MemberError>;
}
