//! Session credentials.

use serde::{Deserialize, Serialize};

use super::user::User;

/// The access/refresh pair. Always replaced as a unit.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Longer-lived credential exchanged for new access tokens.
    pub refresh_token: String,
}

impl TokenPair {
    /// Creates a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns a pair with a new access token, rotating the refresh token
    /// only when the server issued one.
    pub fn rotated(&self, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token: refresh_token.unwrap_or_else(|| self.refresh_token.clone()),
        }
    }
}

// Tokens never reach logs through `{:?}`.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// The current session: credentials plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Credentials.
    pub tokens: TokenPair,
    /// The authenticated user, once known.
    pub user: Option<User>,
}

impl Session {
    /// Creates a session.
    pub fn new(tokens: TokenPair, user: Option<User>) -> Self {
        Self { tokens, user }
    }
}
