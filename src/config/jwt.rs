//! JWT configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Minimum HS256 secret length accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Longest accepted access token lifetime: one week.
pub const MAX_ACCESS_TOKEN_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted refresh token lifetime: one year.
pub const MAX_REFRESH_TOKEN_DAYS: u64 = 365;

/// Signing secret and token lifetimes
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: SecretString,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_minutes")]
    pub access_token_expire_minutes: u64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_days")]
    pub refresh_token_expire_days: u64,
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expire_minutes.saturating_mul(60))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_expire_days.saturating_mul(24 * 60 * 60))
    }

    /// Validate secret and lifetimes. Short secrets are tolerated outside
    /// production so local setups stay simple.
    pub fn validate(&self, is_production: bool) -> Result<(), ValidationError> {
        let secret_len = self.secret.expose_secret().len();
        if secret_len == 0 {
            return Err(ValidationError::MissingRequired("JWT__SECRET"));
        }
        if is_production && secret_len < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort {
                min: MIN_PRODUCTION_SECRET_LEN,
            });
        }
        if self.access_token_expire_minutes == 0 {
            return Err(ValidationError::InvalidTokenLifetime("access token lifetime must be positive"));
        }
        if self.access_token_expire_minutes > MAX_ACCESS_TOKEN_MINUTES {
            return Err(ValidationError::InvalidTokenLifetime("access token lifetime exceeds one week"));
        }
        if self.refresh_token_expire_days > MAX_REFRESH_TOKEN_DAYS {
            return Err(ValidationError::InvalidTokenLifetime("refresh token lifetime exceeds one year"));
        }
        if self.refresh_ttl() <= self.access_ttl() {
            return Err(ValidationError::InvalidTokenLifetime("refresh token must outlive access token"));
        }
        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: SecretString::new(String::new()),
            access_token_expire_minutes: default_access_minutes(),
            refresh_token_expire_days: default_refresh_days(),
        }
    }
}

fn default_access_minutes() -> u64 {
    30
}

fn default_refresh_days() -> u64 {
    14
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: SecretString::new(secret.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_jwt_config_defaults() {
        let config = JwtConfig::default();
        assert_eq!(config.access_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(14 * 86_400));
    }

    #[test]
    fn test_missing_secret() {
        assert_eq!(
            JwtConfig::default().validate(false),
            Err(ValidationError::MissingRequired("JWT__SECRET"))
        );
    }

    #[test]
    fn test_short_secret_only_rejected_in_production() {
        let config = with_secret("dev-secret");
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::JwtSecretTooShort { min: 32 })
        );
    }

    #[test]
    fn test_zero_access_lifetime() {
        let config = JwtConfig {
            access_token_expire_minutes: 0,
            ..with_secret("dev-secret")
        };
        assert!(matches!(config.validate(false), Err(ValidationError::InvalidTokenLifetime(_))));
    }

    #[test]
    fn test_refresh_must_outlive_access() {
        let config = JwtConfig {
            access_token_expire_minutes: 2 * 24 * 60,
            refresh_token_expire_days: 1,
            ..with_secret("dev-secret")
        };
        assert!(matches!(config.validate(false), Err(ValidationError::InvalidTokenLifetime(_))));
    }

    #[test]
    fn test_lifetimes_are_capped() {
        let refresh = JwtConfig {
            refresh_token_expire_days: 1_000_000_000,
            ..with_secret(&"x".repeat(MIN_PRODUCTION_SECRET_LEN))
        };
        assert!(matches!(refresh.validate(true), Err(ValidationError::InvalidTokenLifetime(_))));

        let access = JwtConfig {
            access_token_expire_minutes: MAX_ACCESS_TOKEN_MINUTES + 1,
            refresh_token_expire_days: MAX_REFRESH_TOKEN_DAYS,
            ..with_secret("dev-secret")
        };
        assert!(matches!(access.validate(false), Err(ValidationError::InvalidTokenLifetime(_))));

        let longest = JwtConfig {
            refresh_token_expire_days: MAX_REFRESH_TOKEN_DAYS,
            ..with_secret("dev-secret")
        };
        assert!(longest.validate(false).is_ok());
    }

    #[test]
    fn test_ttl_saturates_on_huge_values() {
        let config = JwtConfig {
            refresh_token_expire_days: u64::MAX,
            ..with_secret("dev-secret")
        };
        assert_eq!(config.refresh_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = with_secret("super-secret-value");
        assert!(!format!("{:?}", config).contains("super-secret-value"));
    }
}
