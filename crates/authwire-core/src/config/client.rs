//! HTTP client and API endpoint configuration.

use serde::{Deserialize, Serialize};

/// Settings for the authenticated HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API server. Request paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Refresh endpoint path.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Login endpoint path.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Logout endpoint path.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Current-user endpoint path.
    #[serde(default = "default_me_path")]
    pub me_path: String,
}

impl ClientConfig {
    /// Joins `path` onto the base URL, tolerating duplicate or missing slashes.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Whether the base URL uses TLS.
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            me_path: default_me_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("authwire/{}", env!("CARGO_PKG_VERSION"))
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_me_path() -> String {
    "/auth/me".to_string()
}
