//! Default navigator.

use tracing::warn;

use authwire_core::traits::Navigator;

/// Logs redirects. Used where no UI shell is attached (CLI, services).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        warn!(route, "Session ended; sign in again");
    }
}
