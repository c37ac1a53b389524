//! Persisted session records with per-token expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use authwire_core::config::TokenConfig;
use authwire_core::types::{Session, TokenPair, User};

/// Lifetimes applied to persisted tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    /// Access token lifetime.
    pub access: Duration,
    /// Refresh token lifetime.
    pub refresh: Duration,
}

impl TokenLifetimes {
    /// Builds lifetimes from configuration.
    pub fn from_config(config: &TokenConfig) -> Self {
        Self {
            access: Duration::hours(config.access_ttl_hours as i64),
            refresh: Duration::days(config.refresh_ttl_days as i64),
        }
    }

    /// Stamps a session for persistence.
    ///
    /// The refresh expiry carries over from `previous` when the refresh
    /// token was not rotated; a refresh does not extend its own lifetime.
    pub fn stamp(
        &self,
        previous: Option<&PersistedSession>,
        session: &Session,
        now: DateTime<Utc>,
    ) -> PersistedSession {
        let refresh_expires_at = match previous {
            Some(prev) if prev.refresh_token == session.tokens.refresh_token => {
                prev.refresh_expires_at
            }
            _ => now + self.refresh,
        };

        PersistedSession {
            access_token: session.tokens.access_token.clone(),
            access_expires_at: now + self.access,
            refresh_token: session.tokens.refresh_token.clone(),
            refresh_expires_at,
            user: session.user.clone(),
            saved_at: now,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self::from_config(&TokenConfig::default())
    }
}

/// On-disk representation of a session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Access token.
    pub access_token: String,
    /// When the access token stops being persisted.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token.
    pub refresh_token: String,
    /// When the refresh token stops being persisted.
    pub refresh_expires_at: DateTime<Utc>,
    /// Cached user profile.
    #[serde(default)]
    pub user: Option<User>,
    /// Last write time.
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Converts back to a live session, or `None` once the refresh token expired.
    ///
    /// A stale access token is still returned: the server rejects it and the
    /// refresh path takes over.
    pub fn into_session(self, now: DateTime<Utc>) -> Option<Session> {
        if self.refresh_expires_at <= now {
            return None;
        }
        Some(Session::new(
            TokenPair::new(self.access_token, self.refresh_token),
            self.user,
        ))
    }

    /// Whether the access token outlived its persisted lifetime.
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at <= now
    }
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("user", &self.user)
            .field("saved_at", &self.saved_at)
            .finish_non_exhaustive()
    }
}
