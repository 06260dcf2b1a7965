//! Lock key resolution.
//!
//! Call sites hand the coordinator a closure returning the business values
//! to lock on. [`KeyResolver`] binds those values into a namespace and
//! rejects empty results before any lock is attempted.

use std::fmt;

use crate::domain::foundation::{AdminId, MemberId, TeamId};

use super::{LockError, LockName};

/// One resolved lock key, e.g. `DIARY_WRITE_42_20240309HTNC0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey(String);

impl LockKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, sorted, de-duplicated set of keys locked as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockKeys {
    keys: Vec<LockKey>,
}

impl LockKeys {
    /// More than one key means an all-or-nothing composite lock.
    pub fn is_composite(&self) -> bool {
        self.keys.len() > 1
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First key in sort order, used to label log lines and errors.
    pub fn primary(&self) -> &LockKey {
        &self.keys[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &LockKey> {
        self.keys.iter()
    }

    /// Raw key strings, in acquisition order.
    pub fn as_strs(&self) -> Vec<&str> {
        self.keys.iter().map(LockKey::as_str).collect()
    }
}

impl fmt::Display for LockKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_composite() {
            write!(f, "{} (+{} more)", self.primary(), self.keys.len() - 1)
        } else {
            write!(f, "{}", self.primary())
        }
    }
}

/// Values a key extractor may return.
///
/// A scalar yields one value, a sequence one value per element, and `None`
/// yields nothing (which the resolver rejects).
pub trait IntoLockValues {
    fn into_lock_values(self) -> Vec<String>;
}

impl IntoLockValues for String {
    fn into_lock_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoLockValues for &str {
    fn into_lock_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

macro_rules! display_lock_values {
    ($($t:ty),*) => {
        $(
            impl IntoLockValues for $t {
                fn into_lock_values(self) -> Vec<String> {
                    vec![self.to_string()]
                }
            }
        )*
    };
}

display_lock_values!(i32, i64, u32, u64, MemberId, AdminId, TeamId);

impl<T: IntoLockValues> IntoLockValues for Option<T> {
    fn into_lock_values(self) -> Vec<String> {
        self.map(IntoLockValues::into_lock_values).unwrap_or_default()
    }
}

impl<T: IntoLockValues> IntoLockValues for Vec<T> {
    fn into_lock_values(self) -> Vec<String> {
        self.into_iter().flat_map(IntoLockValues::into_lock_values).collect()
    }
}

/// Binds extracted values into a lock namespace.
pub struct KeyResolver;

impl KeyResolver {
    /// Resolves `values` into the keys to lock.
    ///
    /// # Errors
    ///
    /// `LockError::Configuration` when the extractor produced no value or a
    /// blank one. This is a programming error at the call site and is never
    /// retried.
    pub fn resolve(name: LockName, values: impl IntoLockValues) -> Result<LockKeys, LockError> {
        let values = values.into_lock_values();
        if values.is_empty() {
            return Err(LockError::configuration(name, "key extractor produced no value"));
        }
        if values.iter().any(|v| v.trim().is_empty()) {
            return Err(LockError::configuration(name, "key extractor produced a blank value"));
        }

        let mut keys: Vec<LockKey> = values.iter().map(|v| LockKey(name.key_for(v))).collect();
        keys.sort();
        keys.dedup();

        Ok(LockKeys { keys })
    }
}
