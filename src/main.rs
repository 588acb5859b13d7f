use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use loan_agency_client::auth::SqliteStore;
use loan_agency_client::config::{CliArgs, Config};
use loan_agency_client::{ApiClient, NetworkError};

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::debug!("API base URL: {}", config.base_url);
    tracing::debug!("Credential store: {}", config.credentials_db.display());

    let store = SqliteStore::open(&config.credentials_db).with_context(|| {
        format!(
            "Failed to open credential store at {}",
            config.credentials_db.display()
        )
    })?;

    let api = Arc::new(ApiClient::new(&config.client_config(), Arc::new(store))?);

    cli::run(args.command, api).await
}

/// One user-facing line naming the failure
fn report_error(err: &anyhow::Error) {
    let network = err.chain().find_map(|e| e.downcast_ref::<NetworkError>());

    match network {
        Some(e) if e.is_session_expired() => {
            eprintln!("Error: {}", e);
            eprintln!("Your session has expired. Run `loan-agency sign-in` to continue.");
        }
        Some(NetworkError::Transport { kind, .. }) => {
            eprintln!("Error: could not reach the server ({})", kind);
        }
        Some(e) => eprintln!("Error: {}", e),
        None => eprintln!("Error: {:#}", err),
    }
}
