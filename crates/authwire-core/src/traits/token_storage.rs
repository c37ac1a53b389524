//! Durable token persistence.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Session;

/// Trait for token persistence backends (memory, file).
///
/// The token store calls `save` after every in-memory swap and `clear`
/// when a session ends. Backends are responsible for expiry: `load`
/// never returns a token past its persisted lifetime.
#[async_trait]
pub trait TokenStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Load the persisted session, if one exists and has not expired.
    async fn load(&self) -> AppResult<Option<Session>>;

    /// Persist the session, replacing any previous one.
    async fn save(&self, session: &Session) -> AppResult<()>;

    /// Remove both tokens.
    async fn clear(&self) -> AppResult<()>;

    /// Short name used in logs.
    fn backend_name(&self) -> &str;
}
