//! Sign-out command.

use authwire_core::error::AppError;
use authwire_http::SessionManager;

use crate::output;

/// Execute logout
pub async fn execute(manager: &SessionManager) -> Result<(), AppError> {
    manager.store().restore().await?;

    if manager.logout().await? {
        output::print_success("Signed out");
    } else {
        output::print_warning("No active session");
    }
    Ok(())
}
