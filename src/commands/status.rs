//! Session status command.

use clap::Args;
use serde::Serialize;

use authwire_auth::refresh::CoordinatorStats;
use authwire_auth::session::SessionSnapshot;
use authwire_core::error::AppError;
use authwire_http::SessionManager;

use crate::output::{self, FieldRow, OutputFormat};

/// Arguments for status
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Verify the session against the server (refreshing it if needed)
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, Serialize)]
struct StatusView {
    session: SessionSnapshot,
    backend: String,
    base_url: String,
    refresh: CoordinatorStats,
}

/// Execute status
pub async fn execute(
    args: &StatusArgs,
    manager: &SessionManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    if args.verify {
        if manager.restore().await?.is_none() {
            output::print_warning("No session could be restored");
        }
    } else {
        manager.store().restore().await?;
    }

    let view = StatusView {
        session: manager.state().snapshot(),
        backend: manager.config().tokens.storage.to_string(),
        base_url: manager.config().client.base_url.clone(),
        refresh: manager.coordinator().stats(),
    };

    let user = view.session.user.as_ref();
    let rows = vec![
        FieldRow::new("authenticated", view.session.authenticated),
        FieldRow::new("user", user.map(|u| u.email.as_str()).unwrap_or("-")),
        FieldRow::new(
            "role",
            user.map(|u| u.role.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
        FieldRow::new("backend", &view.backend),
        FieldRow::new("base_url", &view.base_url),
        FieldRow::new("refreshes", view.refresh.refreshes_started),
    ];
    output::print_record(&view, rows, format);
    Ok(())
}
