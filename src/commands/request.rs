//! Authenticated request command.

use clap::Args;
use serde::Serialize;

use authwire_core::error::AppError;
use authwire_core::types::Method;
use authwire_http::SessionManager;

use crate::output::{self, OutputFormat};

/// Arguments for request
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,
    /// Path relative to the configured base URL
    pub path: String,
    /// JSON request body
    #[arg(short, long)]
    pub body: Option<String>,
    /// Extra header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResponseView {
    status: u16,
    body: serde_json::Value,
}

/// Execute request
pub async fn execute(
    args: &RequestArgs,
    manager: &SessionManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    let method: Method = args.method.parse()?;
    let body = args
        .body
        .as_deref()
        .map(|b| serde_json::from_str::<serde_json::Value>(b))
        .transpose()
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;
    let headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>, _>>()?;

    manager.store().restore().await?;
    let response = manager
        .client()
        .execute(method, &args.path, body, headers)
        .await?;

    let body = response
        .json::<serde_json::Value>()
        .unwrap_or_else(|_| serde_json::Value::String(response.text()));

    match format {
        OutputFormat::Json => output::print_json(&ResponseView {
            status: response.status,
            body,
        }),
        OutputFormat::Table => {
            output::print_kv("status", &response.status.to_string());
            output::print_json(&body);
        }
    }
    Ok(())
}

fn parse_header(raw: &str) -> Result<(String, String), AppError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| AppError::validation(format!("Header must be NAME:VALUE, got '{raw}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Header name must not be empty"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
