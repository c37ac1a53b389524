//! Navigation guard command.

use clap::Args;

use authwire_auth::guard::GuardDecision;
use authwire_core::error::AppError;
use authwire_core::types::UserRole;
use authwire_http::SessionManager;

use crate::output::{self, FieldRow, OutputFormat};

/// Arguments for guard
#[derive(Debug, Args)]
pub struct GuardArgs {
    /// Navigation target
    pub path: String,
    /// Allowed role (repeatable); the route policy applies when omitted
    #[arg(short, long = "role")]
    pub roles: Vec<String>,
}

/// Execute guard
pub async fn execute(
    args: &GuardArgs,
    manager: &SessionManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    let roles = args
        .roles
        .iter()
        .map(|r| r.parse::<UserRole>())
        .collect::<Result<Vec<_>, _>>()?;

    manager.store().restore().await?;
    let decision = if roles.is_empty() {
        manager.guard().admit(&args.path)
    } else {
        manager.guard().check(&args.path, &roles)
    };

    let rows = match &decision {
        GuardDecision::Admit => vec![FieldRow::new("decision", "admit")],
        GuardDecision::Redirect { to, reason } => vec![
            FieldRow::new("decision", "redirect"),
            FieldRow::new("to", to),
            FieldRow::new("reason", reason),
        ],
    };
    output::print_record(&decision, rows, format);
    Ok(())
}
