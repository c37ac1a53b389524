//! Refresh state machine states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the coordinator is in the refresh cycle.
///
/// `Failed` only exists while a failed refresh tears the session down;
/// the coordinator then returns to `Idle` with an empty store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// No refresh in flight.
    Idle,
    /// One refresh call is outstanding; 401s queue behind it.
    Refreshing,
    /// The refresh failed and the session is being cleared.
    Failed,
}

impl RefreshState {
    /// Whether new 401s must wait for the outstanding refresh.
    pub fn is_refreshing(&self) -> bool {
        matches!(self, Self::Refreshing)
    }
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => write!(f, "idle"),
            RefreshState::Refreshing => write!(f, "refreshing"),
            RefreshState::Failed => write!(f, "failed"),
        }
    }
}
