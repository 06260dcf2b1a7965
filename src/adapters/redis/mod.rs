//! Redis adapters.
//!
//! Production implementations of the coordination ports. All of them share
//! one `MultiplexedConnection`, cloned per call.
//!
//! ## Available Adapters
//!
//! - `RedisDistributedLock` - owner-token locks with PX leases
//! - `RedisRefreshTokenStore` - one session key per principal
//! - `RedisEventStream` - consumer-group reads, acks and dead-letter appends
//! - `RedisProcessedEventStore` - idempotency markers with a TTL

mod lock;
mod processed_events;
mod session_store;
mod stream;

pub use lock::RedisDistributedLock;
pub use processed_events::RedisProcessedEventStore;
pub use session_store::RedisRefreshTokenStore;
pub use stream::RedisEventStream;

#[cfg(test)]
pub(crate) async fn test_connection() -> redis::aio::MultiplexedConnection {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let client = redis::Client::open(url).unwrap();
    client.get_multiplexed_tokio_connection().await.unwrap()
}
