//! In-memory adapters.
//!
//! Every Redis-backed port has an in-memory counterpart here, used by the
//! test suite and for single-node runs without Redis.

mod lock;
mod member_repository;
mod processed_events;
mod push_audience;
mod session_store;
mod stream;

pub use lock::InMemoryDistributedLock;
pub use member_repository::InMemoryMemberRepository;
pub use processed_events::InMemoryProcessedEventStore;
pub use push_audience::InMemoryPushAudience;
pub use session_store::InMemoryRefreshTokenStore;
pub use stream::InMemoryEventStream;
