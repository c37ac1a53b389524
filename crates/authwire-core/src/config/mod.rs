//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files layered with `AUTHWIRE__`-prefixed environment variables.
//! Each sub-module represents a logical configuration section.

pub mod client;
pub mod guard;
pub mod logging;
pub mod tokens;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::client::ClientConfig;
pub use self::guard::{GuardConfig, ProtectedRoute};
pub use self::logging::LoggingConfig;
pub use self::tokens::{TokenBackend, TokenConfig};

use crate::error::AppError;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; plain HTTP and unrestricted token files allowed.
    Development,
    /// Production; TLS and secure token persistence are mandatory.
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Root configuration.
///
/// Top-level deserialization target for `config/default.toml`, an optional
/// overlay file, and environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
    /// HTTP client settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Token persistence settings.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Navigation guard settings.
    #[serde(default)]
    pub guard: GuardConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default` (if present), the optional overlay at `path`,
    /// and environment variables prefixed with `AUTHWIRE__`, then validates
    /// the result.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("AUTHWIRE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would leak credentials.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.client.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "client.timeout_seconds must be greater than zero",
            ));
        }

        if self.environment == Environment::Production {
            if !self.client.is_https() {
                return Err(AppError::configuration(format!(
                    "client.base_url must use https in production (got '{}')",
                    self.client.base_url
                )));
            }
            if !self.tokens.secure {
                return Err(AppError::configuration(
                    "tokens.secure must be enabled in production",
                ));
            }
        }

        Ok(())
    }
}
