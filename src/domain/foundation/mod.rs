//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and the request
//! context that form the vocabulary of the coordination core.

mod context;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use context::RequestContext;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AdminId, MemberId, RequestId, TeamId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
