//! Atrium admin command line client
//!
//! Logs in against the Atrium REST API, keeps the session on disk and
//! manages events, blog posts, user accounts and permissions from the
//! terminal.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

mod cli;
mod commands;
mod output;

use atrium_client::{ClientError, Dashboard, SessionEvent};
use atrium_core::Config;
use clap::Parser;
use cli::{Cli, Commands, ConfigCommands};
use commands::Outcome;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing::{debug, error};

/// Exit status when the backend rejected the stored session
const EXIT_SESSION_EXPIRED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (for development convenience)
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = atrium_core::init_logging(&config.logging) {
        eprintln!("Warning: {e}");
    }
    if let Err(e) = dotenv {
        debug!("No .env file loaded: {e}");
    }

    if let Commands::Config {
        action: ConfigCommands::Show,
    } = &cli.command
    {
        return finish(commands::show_config(&config));
    }

    let dashboard = match Dashboard::new(config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    let mut session_events = dashboard.subscribe();

    let result = commands::dispatch(&dashboard, cli.command).await;

    if session_expired(&mut session_events) {
        eprintln!("Session expired. Run `atrium login` to sign in again.");
        return ExitCode::from(EXIT_SESSION_EXPIRED);
    }
    finish(result)
}

/// Resolve configuration, applying command line overrides last
fn load_config(cli: &Cli) -> atrium_core::Result<Config> {
    let mut config = Config::load_from(cli.config.as_deref())?;

    if let Some(url) = &cli.api_url {
        config.api.base_url.clone_from(url);
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Whether the session was expired while the command ran
fn session_expired(events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut expired = false;
    while let Ok(event) = events.try_recv() {
        debug!(?event, "Session event");
        expired |= event == SessionEvent::Expired;
    }
    expired
}

fn finish(result: Result<Outcome, ClientError>) -> ExitCode {
    match result {
        Ok(Outcome::Complete) => ExitCode::SUCCESS,
        Ok(Outcome::Partial) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
