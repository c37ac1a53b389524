//! In-memory token persistence.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use authwire_core::result::AppResult;
use authwire_core::traits::TokenStorage;
use authwire_core::types::Session;

use super::record::{PersistedSession, TokenLifetimes};

/// Keeps the persisted record in process memory. Used by tests and by
/// short-lived tools that should not leave credentials behind.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    /// The persisted record.
    slot: Mutex<Option<PersistedSession>>,
    /// Lifetimes stamped on every save.
    lifetimes: TokenLifetimes,
    /// Number of `save` calls.
    saves: AtomicUsize,
    /// Number of `clear` calls.
    clears: AtomicUsize,
}

impl MemoryTokenStorage {
    /// Creates an empty backend.
    pub fn new(lifetimes: TokenLifetimes) -> Self {
        Self {
            lifetimes,
            ..Self::default()
        }
    }

    /// Creates a backend that already holds `session`.
    pub fn with_session(lifetimes: TokenLifetimes, session: &Session) -> Self {
        let storage = Self::new(lifetimes);
        *storage.slot.lock() = Some(lifetimes.stamp(None, session, Utc::now()));
        storage
    }

    /// The current record, for inspection.
    pub fn record(&self) -> Option<PersistedSession> {
        self.slot.lock().clone()
    }

    /// How many times the session was saved.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// How many times the session was cleared.
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        let now = Utc::now();
        let mut slot = self.slot.lock();
        let session = slot.clone().and_then(|record| record.into_session(now));
        if session.is_none() {
            *slot = None;
        }
        Ok(session)
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        let mut slot = self.slot.lock();
        let record = self.lifetimes.stamp(slot.as_ref(), session, Utc::now());
        *slot = Some(record);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.slot.lock() = None;
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
