//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid connection timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("JWT secret must be at least {min} bytes in production")]
    JwtSecretTooShort { min: usize },

    #[error("Invalid token lifetime: {0}")]
    InvalidTokenLifetime(&'static str),

    #[error("Invalid lock timing: {0}")]
    InvalidLockTiming(&'static str),

    #[error("Stream batch size must be between 1 and {max}")]
    InvalidBatchSize { max: usize },

    #[error("Stream poll interval must be positive")]
    InvalidPollInterval,
}
