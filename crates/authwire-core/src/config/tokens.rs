//! Token persistence configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the token store persists credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// Keep tokens in process memory only.
    Memory,
    /// Persist tokens to a JSON file.
    File,
}

impl Default for TokenBackend {
    fn default() -> Self {
        Self::Memory
    }
}

impl fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenBackend::Memory => write!(f, "memory"),
            TokenBackend::File => write!(f, "file"),
        }
    }
}

/// Token lifetime and persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// How long a persisted access token stays valid, in hours.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_hours: u64,
    /// How long a persisted refresh token stays valid, in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Persistence backend.
    #[serde(default)]
    pub storage: TokenBackend,
    /// Token file path for the `file` backend.
    #[serde(default = "default_file_path")]
    pub file_path: String,
    /// Restrict persisted tokens to the owning user. Required in production.
    #[serde(default)]
    pub secure: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_hours: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            storage: TokenBackend::default(),
            file_path: default_file_path(),
            secure: false,
        }
    }
}

fn default_access_ttl() -> u64 {
    24
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_file_path() -> String {
    "data/session.json".to_string()
}
