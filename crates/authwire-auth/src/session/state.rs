//! Session state derived from token store transitions.
//!
//! Route guards and UI shells read [`SessionSnapshot`]s from here; only the
//! token store publishes new ones.

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use authwire_core::events::SessionEvent;
use authwire_core::types::{Session, User, UserRole};

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 64;

/// What observers know about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Whether a token pair is present.
    pub authenticated: bool,
    /// The session's user, once known.
    pub user: Option<User>,
}

impl SessionSnapshot {
    /// Derives a snapshot from the token store contents.
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self {
                authenticated: true,
                user: session.user.clone(),
            },
            None => Self::default(),
        }
    }

    /// The user's role, if known.
    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    /// Whether the session belongs to an admin.
    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|r| r.is_admin())
    }
}

/// Publishes snapshots and lifecycle events.
#[derive(Debug)]
pub struct SessionState {
    /// Latest snapshot.
    snapshot: watch::Sender<SessionSnapshot>,
    /// Lifecycle events.
    events: broadcast::Sender<SessionEvent>,
}

impl SessionState {
    /// Creates an unauthenticated state.
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { snapshot, events }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.snapshot.borrow().authenticated
    }

    /// Watches snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Receives lifecycle events published after subscription.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Recomputes the snapshot after a token store transition.
    pub(crate) fn apply(&self, session: Option<&Session>, event: SessionEvent) {
        let next = SessionSnapshot::from_session(session);
        let changed = self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        debug!(changed, event = ?event, "Session state updated");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
