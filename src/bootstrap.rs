//! Wires configuration, Redis and the application services together.
//!
//! The member table and the push transport live outside this crate, so
//! callers hand them in as [`ExternalPorts`].

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapters::auth::JwtTokenSigner;
use crate::adapters::memory::{
    InMemoryDistributedLock, InMemoryEventStream, InMemoryProcessedEventStore, InMemoryRefreshTokenStore,
};
use crate::adapters::redis::{
    RedisDistributedLock, RedisEventStream, RedisProcessedEventStore, RedisRefreshTokenStore,
};
use crate::application::{
    EventConsumer, EventConsumerConfig, IdempotentHandler, LockCoordinator, LockCoordinatorConfig,
    PushNotificationHandler, RegisterMemberHandler, TokenIssuer, TokenLifetimes,
};
use crate::config::{AppConfig, ConfigError, RedisConfig};
use crate::domain::lock::LockName;
use crate::ports::{
    DistributedLock, EventStream, MemberRepository, ProcessedEventStore, PushAudience, PushDispatcher,
    RefreshTokenStore,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Redis connection failed: {0}")]
    Redis(String),

    #[error("Redis connection timed out after {0:?}")]
    RedisTimeout(std::time::Duration),
}

/// Opens the shared multiplexed connection within the configured timeout.
pub async fn connect_redis(config: &RedisConfig) -> Result<MultiplexedConnection, BootstrapError> {
    let client = redis::Client::open(config.url.as_str()).map_err(|e| BootstrapError::Redis(e.to_string()))?;
    let conn = tokio::time::timeout(config.connect_timeout(), client.get_multiplexed_tokio_connection())
        .await
        .map_err(|_| BootstrapError::RedisTimeout(config.connect_timeout()))?
        .map_err(|e| BootstrapError::Redis(e.to_string()))?;
    tracing::info!(url = %config.display_url(), "Connected to Redis");
    Ok(conn)
}

/// Stores backing locks, sessions and the push stream.
#[derive(Clone)]
pub struct CoordinationPorts {
    pub locks: Arc<dyn DistributedLock>,
    pub sessions: Arc<dyn RefreshTokenStore>,
    pub stream: Arc<dyn EventStream>,
    pub processed_events: Arc<dyn ProcessedEventStore>,
}

impl CoordinationPorts {
    /// All four stores on one Redis connection.
    pub fn redis(conn: MultiplexedConnection, config: &AppConfig) -> Self {
        Self {
            locks: Arc::new(RedisDistributedLock::new(conn.clone())),
            sessions: Arc::new(RedisRefreshTokenStore::new(conn.clone())),
            stream: Arc::new(RedisEventStream::new(conn.clone())),
            processed_events: Arc::new(RedisProcessedEventStore::new(conn, config.stream.processed_ttl())),
        }
    }

    /// Process-local stores; locks only serialize within this process.
    pub fn in_memory() -> Self {
        Self {
            locks: Arc::new(InMemoryDistributedLock::new()),
            sessions: Arc::new(InMemoryRefreshTokenStore::new()),
            stream: Arc::new(InMemoryEventStream::new()),
            processed_events: Arc::new(InMemoryProcessedEventStore::new()),
        }
    }
}

/// Ports implemented outside this crate.
#[derive(Clone)]
pub struct ExternalPorts {
    pub members: Arc<dyn MemberRepository>,
    pub audience: Arc<dyn PushAudience>,
    pub dispatcher: Arc<dyn PushDispatcher>,
}

/// The assembled application services.
pub struct Services {
    pub locks: LockCoordinator,
    pub tokens: Arc<TokenIssuer>,
    pub registration: RegisterMemberHandler,
    pub push_consumer: Arc<EventConsumer>,
}

impl Services {
    pub fn assemble(config: &AppConfig, ports: CoordinationPorts, external: ExternalPorts) -> Self {
        let locks = LockCoordinator::with_config(
            ports.locks,
            LockCoordinatorConfig::default()
                .with_retry_interval(config.lock.retry_interval())
                .with_watchdog_lease(config.lock.watchdog_lease()),
        );

        let signer = Arc::new(JwtTokenSigner::new(&config.jwt.secret));
        let lifetimes = TokenLifetimes {
            access: config.jwt.access_ttl(),
            refresh: config.jwt.refresh_ttl(),
        };
        let tokens = Arc::new(TokenIssuer::new(signer, ports.sessions, lifetimes));

        let registration = RegisterMemberHandler::new(external.members, tokens.clone(), locks.clone())
            .with_lock_spec(config.lock.spec(LockName::MemberRegister));

        let handler = IdempotentHandler::new(
            PushNotificationHandler::new(external.audience, external.dispatcher),
            ports.processed_events,
        );
        let consumer_config = EventConsumerConfig::for_stream(&config.stream.key)
            .with_poll_interval(config.stream.poll_interval())
            .with_batch_size(config.stream.batch_size)
            .with_dead_letter_key(config.stream.dead_letter_key());
        let push_consumer = Arc::new(EventConsumer::new(
            ports.stream,
            Arc::new(handler),
            config.stream.coordinates(),
            consumer_config,
        ));

        Self {
            locks,
            tokens,
            registration,
            push_consumer,
        }
    }

    /// Loads config, connects to Redis and assembles everything.
    pub async fn from_env(external: ExternalPorts) -> Result<(AppConfig, Self), BootstrapError> {
        let config = AppConfig::load_validated()?;
        let conn = connect_redis(&config.redis).await?;
        let services = Self::assemble(&config, CoordinationPorts::redis(conn, &config), external);
        Ok((config, services))
    }

    /// Runs the push consumer until `shutdown` flips to true.
    pub fn spawn_push_consumer(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let consumer = self.push_consumer.clone();
        tokio::spawn(async move { consumer.run(shutdown).await })
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("locks", &self.locks)
            .field("registration", &self.registration)
            .field("push_consumer", &self.push_consumer.source())
            .finish_non_exhaustive()
    }
}
