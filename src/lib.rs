//! Victory Fairy - Redis-backed coordination for the baseball diary backend.
//!
//! Three concerns share one Redis instance:
//!
//! - **Distributed locks** - [`application::LockCoordinator`] serializes
//!   critical sections such as first-time member registration across nodes.
//! - **Refresh-token sessions** - [`application::TokenIssuer`] issues,
//!   rotates and revokes one refresh token per principal.
//! - **Push events** - [`application::EventConsumer`] reads match status
//!   records from a consumer group and drives push notifications.
//!
//! [`bootstrap::Services`] assembles all of them from [`config::AppConfig`].

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
