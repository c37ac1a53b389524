//! Sign-in command.

use clap::Args;

use authwire_core::error::AppError;
use authwire_http::SessionManager;

use crate::output::{self, FieldRow, OutputFormat};

/// Arguments for login
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted if omitted)
    #[arg(short, long)]
    pub email: Option<String>,
}

/// Execute login
pub async fn execute(
    args: &LoginArgs,
    manager: &SessionManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    let email = match &args.email {
        Some(email) => email.clone(),
        None => dialoguer::Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Prompt failed: {e}")))?,
    };

    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| AppError::internal(format!("Prompt failed: {e}")))?;

    let user = manager.login(&email, &password).await?;

    match format {
        OutputFormat::Json => output::print_json(&user),
        OutputFormat::Table => {
            output::print_success(&format!("Signed in as {}", user.email));
            output::print_record(
                &user,
                vec![
                    FieldRow::new("id", &user.id),
                    FieldRow::new("role", user.role),
                    FieldRow::new("username", user.username.as_deref().unwrap_or("-")),
                ],
                format,
            );
        }
    }
    Ok(())
}
