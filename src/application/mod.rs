//! Application layer - services that orchestrate domain operations
//! through ports.

mod event_consumer;
mod idempotent_handler;
mod lock_coordinator;
mod push_notification;
mod register_member;
mod token_issuer;

pub use event_consumer::{BatchReport, EventConsumer, EventConsumerConfig};
pub use idempotent_handler::IdempotentHandler;
pub use lock_coordinator::{LockCoordinator, LockCoordinatorConfig};
pub use push_notification::PushNotificationHandler;
pub use register_member::{LoginResult, RegisterMemberHandler};
pub use token_issuer::{TokenIssuer, TokenLifetimes};
