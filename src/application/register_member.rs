//! RegisterMemberHandler - SNS login with serialized first-time sign-up.
//!
//! The member table has no unique constraint on `(sns_type, sns_id)`, so two
//! concurrent first logins would both miss the lookup and insert twice. The
//! locked entry point holds `MEMBER_REGISTER_{SNS_TYPE}_{snsId}` around the
//! whole find-or-insert.

use std::sync::Arc;

use crate::domain::auth::{Principal, TokenPair};
use crate::domain::foundation::{MemberId, RequestContext, Timestamp};
use crate::domain::lock::{LockName, LockSpec};
use crate::domain::member::{MemberError, NewMember, SnsIdentity, SnsType};
use crate::ports::MemberRepository;

use super::{LockCoordinator, TokenIssuer};

/// Outcome of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub member_id: MemberId,
    pub tokens: TokenPair,
    /// True when this login created the member.
    pub is_new_member: bool,
    /// Onboarding progress for the client.
    pub has_nickname: bool,
    pub has_team: bool,
}

pub struct RegisterMemberHandler {
    members: Arc<dyn MemberRepository>,
    issuer: Arc<TokenIssuer>,
    locks: LockCoordinator,
    lock_spec: LockSpec,
}

impl RegisterMemberHandler {
    pub fn new(members: Arc<dyn MemberRepository>, issuer: Arc<TokenIssuer>, locks: LockCoordinator) -> Self {
        Self {
            members,
            issuer,
            locks,
            lock_spec: LockSpec::new(LockName::MemberRegister),
        }
    }

    /// Overrides the default 5s wait / 5s lease.
    pub fn with_lock_spec(mut self, spec: LockSpec) -> Self {
        self.lock_spec = LockSpec { name: LockName::MemberRegister, ..spec };
        self
    }

    /// Logs in, creating the member on first login. Concurrent first logins
    /// of one identity yield a single member.
    pub async fn register(&self, sns_type: SnsType, identity: SnsIdentity, ctx: &RequestContext) -> Result<LoginResult, MemberError> {
        let key = identity.registration_key(sns_type);
        self.locks
            .with_lock(self.lock_spec, || key, || self.process_login(sns_type, &identity, ctx))
            .await
    }

    /// Find-or-insert, record the login and issue tokens. Not serialized;
    /// call through [`register`](Self::register).
    pub async fn process_login(&self, sns_type: SnsType, identity: &SnsIdentity, ctx: &RequestContext) -> Result<LoginResult, MemberError> {
        let (member, is_new_member) = match self.members.find_by_sns(sns_type, &identity.sns_id).await? {
            Some(member) => (member, false),
            None => {
                let member = self
                    .members
                    .insert(NewMember {
                        sns_type,
                        sns_id: identity.sns_id.clone(),
                        email: identity.email.clone(),
                    })
                    .await?;
                tracing::info!(
                    request_id = %ctx.request_id,
                    member_id = %member.id,
                    sns_type = %sns_type,
                    "Registered new member"
                );
                (member, true)
            }
        };

        self.members
            .record_login(member.id, Timestamp::now(), ctx.remote_ip().map(str::to_string))
            .await?;

        let tokens = self.issuer.issue(&Principal::member(member.id), ctx).await?;

        Ok(LoginResult {
            member_id: member.id,
            tokens,
            is_new_member,
            has_nickname: member.has_nickname(),
            has_team: member.has_team(),
        })
    }
}

impl std::fmt::Debug for RegisterMemberHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterMemberHandler")
            .field("lock_spec", &self.lock_spec)
            .finish_non_exhaustive()
    }
}
