//! Navigation side effects requested by the session lifecycle.

/// Receives forced redirects, e.g. to the login route after the session
/// could not be refreshed.
pub trait Navigator: Send + Sync + std::fmt::Debug + 'static {
    /// Navigate to `route`, replacing the current location.
    fn redirect(&self, route: &str);
}
