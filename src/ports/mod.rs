//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Coordination Ports
//!
//! - `DistributedLock` - Cross-process lock store
//! - `RefreshTokenStore` - One live refresh token per principal
//! - `TokenSigner` - Token signing and verification
//!
//! ## Stream Ports
//!
//! - `EventStream` - Consumer-group reads, acks and appends
//! - `StreamHandler` - Handler invoked per decoded record
//! - `ProcessedEventStore` - Idempotency tracking for stream handlers
//!
//! ## Collaborator Ports
//!
//! - `PushAudience`, `PushDispatcher` - Push targets and transport
//! - `MemberRepository` - Member rows for the login flow

mod distributed_lock;
mod event_stream;
mod member_repository;
mod processed_event_store;
mod push;
mod refresh_token_store;
mod stream_handler;
mod token_signer;

pub use distributed_lock::{DistributedLock, HeldLock, LockOwnership};
pub use event_stream::{EventStream, ReadPosition};
pub use member_repository::MemberRepository;
pub use processed_event_store::{processed_event_key, ProcessedEventStore};
pub use push::{PushAudience, PushDispatcher};
pub use refresh_token_store::{tokens_match, RefreshTokenStore};
pub use stream_handler::{HandleOutcome, StreamHandler};
pub use token_signer::TokenSigner;
