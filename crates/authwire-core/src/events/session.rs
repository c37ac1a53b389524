//! Session-related events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownReason {
    /// The user logged out.
    Logout,
    /// The refresh token was rejected or the refresh endpoint was unreachable.
    RefreshFailed,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownReason::Logout => write!(f, "logout"),
            TeardownReason::RefreshFailed => write!(f, "refresh_failed"),
        }
    }
}

/// Events emitted on every token store transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A new session was installed (login or restore).
    Established {
        /// The user's id, if known.
        user_id: Option<String>,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// The access token was replaced by a refresh.
    Refreshed {
        /// Whether the refresh token was rotated too.
        rotated: bool,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// The user profile attached to the session changed.
    UserUpdated {
        /// The user's id.
        user_id: String,
    },
    /// The session was destroyed.
    Cleared {
        /// Why.
        reason: TeardownReason,
        /// When it happened.
        at: DateTime<Utc>,
    },
}
