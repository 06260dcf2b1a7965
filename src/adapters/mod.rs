//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `redis` - Production lock, session, stream and marker stores
//! - `memory` - In-memory counterparts for tests and single-node runs
//! - `auth` - JWT signing
//! - `push` - Push transport stand-in

pub mod auth;
pub mod memory;
pub mod push;
pub mod redis;

pub use auth::JwtTokenSigner;
pub use memory::{
    InMemoryDistributedLock, InMemoryEventStream, InMemoryMemberRepository, InMemoryProcessedEventStore,
    InMemoryPushAudience, InMemoryRefreshTokenStore,
};
pub use push::{RecordingPushDispatcher, SentPush};
pub use self::redis::{RedisDistributedLock, RedisEventStream, RedisProcessedEventStore, RedisRefreshTokenStore};
