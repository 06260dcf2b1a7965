//! Distributed lock vocabulary.
//!
//! Types describing *what* to serialize ([`LockSpec`], [`LockKeys`]) and the
//! lifecycle of one acquisition ([`LockPhase`]). The mechanics live behind
//! the `DistributedLock` port and in `application::LockCoordinator`.

mod errors;
mod key;
mod name;
mod phase;
mod spec;

pub use errors::LockError;
pub use key::{IntoLockValues, KeyResolver, LockKey, LockKeys};
pub use name::LockName;
pub use phase::LockPhase;
pub use spec::{LeaseTime, LockSpec, DEFAULT_LEASE, DEFAULT_WAIT};
