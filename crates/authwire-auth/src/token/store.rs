//! The token store: single writer, many readers.
//!
//! Readers load the current [`Session`] through an `ArcSwapOption`, so a
//! reader sees either the old pair or the new pair, never a mix. Writers
//! are serialized by an async mutex that also covers persistence, so the
//! backend's contents follow the same order as the in-memory swaps.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};

use authwire_core::events::{SessionEvent, TeardownReason};
use authwire_core::result::AppResult;
use authwire_core::traits::TokenStorage;
use authwire_core::types::{Session, TokenPair, User};

use crate::session::SessionState;

/// Holds the current session and persists every transition.
///
/// Persistence failures are logged and do not undo the in-memory
/// transition: the live session stays authoritative for this process.
#[derive(Debug)]
pub struct TokenStore {
    /// Current session.
    current: ArcSwapOption<Session>,
    /// Durable backend.
    storage: Arc<dyn TokenStorage>,
    /// Observable state recomputed on each transition.
    state: Arc<SessionState>,
    /// Serializes writers.
    writer: Mutex<()>,
}

impl TokenStore {
    /// Creates an empty store over `storage`.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            storage,
            state: Arc::new(SessionState::new()),
            writer: Mutex::new(()),
        }
    }

    /// The observable session state fed by this store.
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// The current token pair.
    pub fn get(&self) -> Option<TokenPair> {
        self.current.load().as_ref().map(|s| s.tokens.clone())
    }

    /// The current access token.
    pub fn access_token(&self) -> Option<String> {
        self.current
            .load()
            .as_ref()
            .map(|s| s.tokens.access_token.clone())
    }

    /// The current session.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    /// Whether a session is present.
    pub fn is_populated(&self) -> bool {
        self.current.load().is_some()
    }

    /// Replaces the token pair, keeping the current user.
    pub async fn set(&self, tokens: TokenPair) {
        let _writer = self.writer.lock().await;
        let previous = self.current.load_full();
        let rotated = previous
            .as_ref()
            .is_none_or(|s| s.tokens.refresh_token != tokens.refresh_token);
        let user = previous.and_then(|s| s.user.clone());
        self.install(
            Session::new(tokens, user),
            SessionEvent::Refreshed {
                rotated,
                at: Utc::now(),
            },
        )
        .await;
    }

    /// Installs a whole new session (login or restore).
    pub async fn set_session(&self, session: Session) {
        let _writer = self.writer.lock().await;
        let user_id = session.user.as_ref().map(|u| u.id.clone());
        self.install(
            session,
            SessionEvent::Established {
                user_id,
                at: Utc::now(),
            },
        )
        .await;
    }

    /// Swaps in a refreshed access token if `expected` is still the current pair.
    ///
    /// Returns `false` and writes nothing when the session was cleared or
    /// replaced while the refresh was in flight.
    pub async fn rotate_if_current(
        &self,
        expected: &TokenPair,
        access_token: String,
        refresh_token: Option<String>,
    ) -> bool {
        let _writer = self.writer.lock().await;
        let Some(current) = self.current.load_full() else {
            return false;
        };
        if current.tokens != *expected {
            return false;
        }

        let rotated = refresh_token.is_some();
        let tokens = current.tokens.rotated(access_token, refresh_token);
        self.install(
            Session::new(tokens, current.user.clone()),
            SessionEvent::Refreshed {
                rotated,
                at: Utc::now(),
            },
        )
        .await;
        true
    }

    /// Replaces the user attached to the current session.
    ///
    /// Returns `false` when there is no session.
    pub async fn update_user(&self, user: User) -> bool {
        let _writer = self.writer.lock().await;
        let Some(current) = self.current.load_full() else {
            return false;
        };
        let user_id = user.id.clone();
        self.install(
            Session::new(current.tokens.clone(), Some(user)),
            SessionEvent::UserUpdated { user_id },
        )
        .await;
        true
    }

    /// Destroys the session and wipes both persisted tokens.
    ///
    /// Returns `true` if a session was present.
    pub async fn clear(&self, reason: TeardownReason) -> bool {
        let _writer = self.writer.lock().await;
        self.teardown(reason).await
    }

    /// Destroys the session only if `expected` is still the current pair.
    ///
    /// Returns `false` and writes nothing when the session was cleared or
    /// replaced meanwhile.
    pub async fn clear_if_current(&self, expected: &TokenPair, reason: TeardownReason) -> bool {
        let _writer = self.writer.lock().await;
        let current = self.current.load();
        if current.as_ref().is_none_or(|s| s.tokens != *expected) {
            return false;
        }
        drop(current);
        self.teardown(reason).await
    }

    /// Swap out, wipe, publish. Caller holds the writer lock.
    async fn teardown(&self, reason: TeardownReason) -> bool {
        let previous = self.current.swap(None);

        if let Err(e) = self.storage.clear().await {
            error!(
                backend = self.storage.backend_name(),
                error = %e,
                "Failed to clear persisted tokens"
            );
        }

        self.state.apply(
            None,
            SessionEvent::Cleared {
                reason,
                at: Utc::now(),
            },
        );

        if previous.is_some() {
            info!(reason = %reason, "Session cleared");
        }
        previous.is_some()
    }

    /// Loads a persisted session into memory.
    ///
    /// Returns `true` if one was found.
    pub async fn restore(&self) -> AppResult<bool> {
        let _writer = self.writer.lock().await;
        let Some(session) = self.storage.load().await? else {
            return Ok(false);
        };

        let user_id = session.user.as_ref().map(|u| u.id.clone());
        let session = Arc::new(session);
        self.current.store(Some(Arc::clone(&session)));
        self.state.apply(
            Some(&session),
            SessionEvent::Established {
                user_id,
                at: Utc::now(),
            },
        );
        info!(
            backend = self.storage.backend_name(),
            "Restored persisted session"
        );
        Ok(true)
    }

    /// Swap, persist, publish. Caller holds the writer lock.
    async fn install(&self, session: Session, event: SessionEvent) {
        let session = Arc::new(session);
        self.current.store(Some(Arc::clone(&session)));

        if let Err(e) = self.storage.save(&session).await {
            error!(
                backend = self.storage.backend_name(),
                error = %e,
                "Failed to persist session"
            );
        }

        self.state.apply(Some(&session), event);
    }
}
