//! Who a token or session belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{AdminId, MemberId};

/// Principal namespace. Members and admins have independent id sequences,
/// so every store key is qualified by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Member,
    Admin,
}

impl PrincipalKind {
    /// Prefix of the refresh-token session key.
    pub fn session_key_prefix(&self) -> &'static str {
        match self {
            PrincipalKind::Member => "refresh_token",
            PrincipalKind::Admin => "admin_refresh_token",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Member => "member",
            PrincipalKind::Admin => "admin",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(namespace, id)` pair that keys a refresh-token session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: i64,
}

impl PrincipalRef {
    pub fn member(id: MemberId) -> Self {
        Self {
            kind: PrincipalKind::Member,
            id: id.as_i64(),
        }
    }

    pub fn admin(id: AdminId) -> Self {
        Self {
            kind: PrincipalKind::Admin,
            id: id.as_i64(),
        }
    }

    /// Redis key of this principal's session, e.g. `refresh_token:7`.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.kind.session_key_prefix(), self.id)
    }
}

impl fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Role claim carried in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Admin,
}

/// Identity a token pair is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub reference: PrincipalRef,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn member(id: MemberId) -> Self {
        Self {
            reference: PrincipalRef::member(id),
            roles: vec![Role::Member],
        }
    }

    pub fn admin(id: AdminId) -> Self {
        Self {
            reference: PrincipalRef::admin(id),
            roles: vec![Role::Admin],
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
