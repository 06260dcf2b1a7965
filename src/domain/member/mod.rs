//! Member identity as far as sign-up serialization needs it.
//!
//! Profile data (nickname, supported team) is carried only to report
//! onboarding progress back to the client on login.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::auth::AuthError;
use crate::domain::foundation::{DomainError, ErrorCode, MemberId, TeamId, Timestamp, ValidationError};
use crate::domain::lock::LockError;

/// Social login provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnsType {
    Kakao,
    Naver,
    Apple,
}

impl SnsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnsType::Kakao => "KAKAO",
            SnsType::Naver => "NAVER",
            SnsType::Apple => "APPLE",
        }
    }
}

impl fmt::Display for SnsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity returned by the SNS provider after the OAuth exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsIdentity {
    pub sns_id: String,
    pub email: Option<String>,
}

impl SnsIdentity {
    pub fn new(sns_id: impl Into<String>, email: Option<String>) -> Result<Self, ValidationError> {
        let sns_id = sns_id.into();
        if sns_id.trim().is_empty() {
            return Err(ValidationError::empty_field("sns_id"));
        }
        Ok(Self { sns_id, email })
    }

    /// Value locked on during sign-up, e.g. `KAKAO_sns123`.
    pub fn registration_key(&self, sns_type: SnsType) -> String {
        format!("{}_{}", sns_type, self.sns_id)
    }
}

/// Persisted member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub sns_type: SnsType,
    pub sns_id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub team_id: Option<TeamId>,
    pub last_login_at: Option<Timestamp>,
    pub last_login_ip: Option<String>,
}

impl Member {
    pub fn has_nickname(&self) -> bool {
        self.nickname.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    pub fn has_team(&self) -> bool {
        self.team_id.is_some()
    }
}

/// Member row to insert on first login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub sns_type: SnsType,
    pub sns_id: String,
    pub email: Option<String>,
}

/// Errors of the login / sign-up flow.
#[derive(Debug, Clone, Error)]
pub enum MemberError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("member storage failed: {0}")]
    Storage(String),
}

impl MemberError {
    pub fn storage(message: impl Into<String>) -> Self {
        MemberError::Storage(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            MemberError::Lock(e) => e.code(),
            MemberError::Auth(e) => e.code(),
            MemberError::Validation(_) => ErrorCode::ValidationFailed,
            MemberError::Storage(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<MemberError> for DomainError {
    fn from(err: MemberError) -> Self {
        match err {
            MemberError::Lock(e) => e.into(),
            MemberError::Auth(e) => e.into(),
            other => DomainError::new(other.code(), other.to_string()),
        }
    }
}
