//! Readiness check for the Saleor SMTP app's auth persistence layer
//!
//! Loads the APL configuration from the environment, checks the store and
//! prints a JSON report on stdout.
//!
//! ```text
//! saleor-smtp-status [SALEOR_API_URL]
//! saleor-smtp-status --list
//! ```
//!
//! Exits non-zero when the configuration is invalid, the store is not ready,
//! or the given Saleor API URL has no installation.

use std::process::ExitCode;

use saleor_smtp_app::AppState;
use saleor_smtp_core::AplError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

enum Command {
    Check(Option<String>),
    List,
}

fn parse_args() -> Command {
    match std::env::args().nth(1) {
        Some(arg) if arg == "--list" => Command::List,
        other => Command::Check(other),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let state = match AppState::from_env() {
        Ok(state) => state,
        Err(e) => {
            if e.is_fatal() {
                tracing::error!("{}", startup_failure(&e));
            } else {
                log_error("Failed to initialize APL", &e);
            }
            return ExitCode::FAILURE;
        }
    };

    match parse_args() {
        Command::Check(saleor_api_url) => check(&state, saleor_api_url.as_deref()).await,
        Command::List => list(&state).await,
    }
}

async fn check(state: &AppState, saleor_api_url: Option<&str>) -> ExitCode {
    let report = state.health_service.check(saleor_api_url).await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("Failed to encode report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if report.ready && report.configured != Some(false) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print the installed Saleor API URLs, never the tokens
async fn list(state: &AppState) -> ExitCode {
    let installations = match state.installation_service.installations().await {
        Ok(installations) => installations,
        Err(e) => {
            log_error("Failed to list installations", &e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("{} installation(s) found", installations.len());
    let urls: Vec<&str> = installations
        .iter()
        .map(|auth| auth.saleor_api_url.as_str())
        .collect();

    match serde_json::to_string_pretty(&urls) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to encode installations: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log line for an error that stops startup; each variant carries its own wording
fn startup_failure(err: &AplError) -> String {
    format!("Refusing to start: {err}")
}

fn log_error(context: &str, err: &AplError) {
    if err.is_expected() {
        tracing::warn!("{}: {}", context, err);
    } else {
        tracing::error!("{}: {}", context, err);
    }
}
