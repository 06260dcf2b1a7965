//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `VICTORY_FAIRY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use victory_fairy::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Consuming {}", config.stream.coordinates());
//! ```

mod error;
mod jwt;
mod lock;
mod logging;
mod redis;
mod stream;

pub use error::{ConfigError, ValidationError};
pub use jwt::{JwtConfig, MIN_PRODUCTION_SECRET_LEN};
pub use lock::{LockConfig, WATCHDOG_LEASE};
pub use logging::{Environment, LogFormat, LoggingConfig};
pub use redis::RedisConfig;
pub use stream::{StreamConfig, MAX_BATCH_SIZE};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment, log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Redis connection shared by locks, sessions and streams
    pub redis: RedisConfig,

    /// Token signing and lifetimes
    pub jwt: JwtConfig,

    /// Default lock timing
    #[serde(default)]
    pub lock: LockConfig,

    /// Push notification stream
    pub stream: StreamConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `VICTORY_FAIRY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `VICTORY_FAIRY__REDIS__URL=redis://...` -> `redis.url = ...`
    /// - `VICTORY_FAIRY__LOCK__LEASE_MS=-1` -> `lock.lease_ms = -1`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VICTORY_FAIRY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.redis.validate()?;
        self.jwt.validate(self.is_production())?;
        self.lock.validate()?;
        self.stream.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.logging.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lock::LeaseTime;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var("VICTORY_FAIRY__REDIS__URL", "redis://localhost:6379");
        env::set_var("VICTORY_FAIRY__JWT__SECRET", "test-secret-that-is-long-enough-32b");
        env::set_var("VICTORY_FAIRY__STREAM__KEY", "push:fcm");
        env::set_var("VICTORY_FAIRY__STREAM__GROUP", "push-group");
        env::set_var("VICTORY_FAIRY__STREAM__CONSUMER", "api-1");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for key in [
            "VICTORY_FAIRY__REDIS__URL",
            "VICTORY_FAIRY__JWT__SECRET",
            "VICTORY_FAIRY__JWT__ACCESS_TOKEN_EXPIRE_MINUTES",
            "VICTORY_FAIRY__STREAM__KEY",
            "VICTORY_FAIRY__STREAM__GROUP",
            "VICTORY_FAIRY__STREAM__CONSUMER",
            "VICTORY_FAIRY__STREAM__BATCH_SIZE",
            "VICTORY_FAIRY__LOCK__LEASE_MS",
            "VICTORY_FAIRY__LOGGING__ENVIRONMENT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.jwt.secret.expose_secret(), "test-secret-that-is-long-enough-32b");
        assert_eq!(config.stream.coordinates().to_string(), "push:fcm/push-group/api-1");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.logging.environment, Environment::Development);
        assert_eq!(config.jwt.access_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.lock.wait(), Duration::from_secs(5));
        assert_eq!(config.stream.batch_size, 10);
    }

    #[test]
    fn test_numeric_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VICTORY_FAIRY__JWT__ACCESS_TOKEN_EXPIRE_MINUTES", "15");
        env::set_var("VICTORY_FAIRY__STREAM__BATCH_SIZE", "50");
        env::set_var("VICTORY_FAIRY__LOCK__LEASE_MS", "-1");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.jwt.access_token_expire_minutes, 15);
        assert_eq!(config.stream.batch_size, 50);
        assert_eq!(config.lock.lease(), LeaseTime::Watchdog);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VICTORY_FAIRY__LOGGING__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_stream_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("VICTORY_FAIRY__STREAM__CONSUMER");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
