//! Lock namespaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of a distributed lock.
///
/// Each variant serializes one kind of business operation; the resolved key
/// is `"{namespace}_{value}"`. Add a variant here when a new operation needs
/// cross-instance serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockName {
    /// Sign-up keyed by `{SNS_TYPE}_{snsId}`.
    MemberRegister,
    /// Diary creation keyed by `{memberId}_{gameMatchId}`.
    DiaryWrite,
    /// Diary edit keyed by diary id.
    DiaryUpdate,
    /// Diary removal keyed by diary id.
    DiaryDelete,
    /// Profile edit keyed by member id.
    UserUpdate,
}

impl LockName {
    /// All namespaces, in declaration order.
    pub const ALL: [LockName; 5] = [
        LockName::MemberRegister,
        LockName::DiaryWrite,
        LockName::DiaryUpdate,
        LockName::DiaryDelete,
        LockName::UserUpdate,
    ];

    /// Returns the key prefix for this namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockName::MemberRegister => "MEMBER_REGISTER",
            LockName::DiaryWrite => "DIARY_WRITE",
            LockName::DiaryUpdate => "DIARY_UPDATE",
            LockName::DiaryDelete => "DIARY_DELETE",
            LockName::UserUpdate => "USER_UPDATE",
        }
    }

    /// Binds a value into this namespace, e.g. `DIARY_WRITE_42_20240309HTNC0`.
    pub fn key_for(&self, value: &str) -> String {
        format!("{}_{}", self.as_str(), value)
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_for_prefixes_namespace() {
        assert_eq!(
            LockName::DiaryWrite.key_for("42_20240309HTNC0"),
            "DIARY_WRITE_42_20240309HTNC0"
        );
        assert_eq!(
            LockName::MemberRegister.key_for("KAKAO_snsId123"),
            "MEMBER_REGISTER_KAKAO_snsId123"
        );
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&LockName::UserUpdate).unwrap();
        assert_eq!(json, "\"USER_UPDATE\"");
    }

    #[test]
    fn every_namespace_has_distinct_prefix() {
        let mut prefixes: Vec<_> = LockName::ALL.iter().map(|n| n.as_str()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), LockName::ALL.len());
    }
}
