//! Domain layer - types and rules with no I/O.

pub mod auth;
pub mod foundation;
pub mod lock;
pub mod member;
pub mod push;
pub mod stream;
