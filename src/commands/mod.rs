//! CLI command definitions and dispatch.

pub mod guard;
pub mod login;
pub mod logout;
pub mod request;
pub mod status;

use clap::{Parser, Subcommand};

use authwire_core::config::{AppConfig, TokenBackend};
use authwire_core::error::AppError;
use authwire_http::SessionManager;

use crate::output::OutputFormat;

/// authwire: authenticated client for the platform API
#[derive(Debug, Parser)]
#[command(name = "authwire", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file layered over config/default.toml
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login(login::LoginArgs),
    /// Sign out and wipe the persisted session
    Logout,
    /// Show the persisted session
    Status(status::StatusArgs),
    /// Send an authenticated request
    Request(request::RequestArgs),
    /// Evaluate the navigation guard for a path
    Guard(guard::GuardArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let manager = build_manager(config)?;
        match &self.command {
            Commands::Login(args) => login::execute(args, &manager, self.format).await,
            Commands::Logout => logout::execute(&manager).await,
            Commands::Status(args) => status::execute(args, &manager, self.format).await,
            Commands::Request(args) => request::execute(args, &manager, self.format).await,
            Commands::Guard(args) => guard::execute(args, &manager, self.format).await,
        }
    }
}

/// Helper: build a session manager persisting to the token file.
///
/// Each CLI invocation is its own process, so the in-memory backend would
/// forget the session immediately.
fn build_manager(mut config: AppConfig) -> Result<SessionManager, AppError> {
    config.tokens.storage = TokenBackend::File;
    SessionManager::from_config(config)
}
