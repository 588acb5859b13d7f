use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ApplicationState;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Loan agency command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// API base URL
    #[arg(short = 'u', long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Path to the credentials SQLite database
    #[arg(short = 'd', long, env = "CREDENTIALS_DB")]
    pub credentials_db: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in with email and password
    SignIn {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    SignUp,

    /// Forget the stored session
    SignOut,

    /// Show the signed-in account
    Whoami,

    /// Request a verification code for a phone number
    VerifyPhone { phone: String },

    /// Confirm a phone number with the received code
    VerifyCode { phone: String, code: String },

    /// Browse the applicant directory
    #[command(subcommand)]
    Users(UsersCommand),

    /// Loan applications
    #[command(subcommand)]
    Applications(ApplicationsCommand),

    /// Upload a file to an API path
    Upload { path: String, file: PathBuf },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum UsersCommand {
    /// List applicants
    List {
        /// Application status filter (pending, approved, rejected, under_review, not_submitted)
        #[arg(long)]
        status: Option<ApplicationState>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a profile with its repayment schedule
    Show { id: u64 },

    /// Apply a JSON patch document to a profile
    Update {
        id: u64,
        #[arg(long)]
        json: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ApplicationsCommand {
    /// Submit an application from a JSON file
    Submit { file: PathBuf },

    /// Show one application
    Show { id: u64 },

    /// List my applications
    Mine,
}

/// Settings used by [`crate::http_client::ApiClient`]
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,

    /// Bound on waiting for another request's refresh
    pub refresh_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            refresh_wait: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // API
    pub base_url: String,

    // Credentials
    pub credentials_db: PathBuf,

    // Timeouts (seconds)
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
    pub refresh_wait_timeout: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Build configuration with priority: CLI > ENV > defaults
    ///
    /// Call `dotenvy::dotenv()` before parsing `args` so `.env` values
    /// take part in the ENV layer.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let credentials_db = match args.credentials_db {
            Some(ref path) => expand_tilde(path),
            None => default_credentials_db()
                .context("Cannot locate a data directory; set CREDENTIALS_DB")?,
        };

        Ok(Config {
            base_url: args.base_url.clone(),
            credentials_db,
            http_connect_timeout: env_or("HTTP_CONNECT_TIMEOUT", 10),
            http_request_timeout: args.request_timeout,
            refresh_wait_timeout: env_or("REFRESH_WAIT_TIMEOUT", 60),
            log_level: args.log_level.clone(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("API_BASE_URL is not a valid URL: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API_BASE_URL must use http or https: {}", self.base_url);
        }

        if self.http_connect_timeout == 0
            || self.http_request_timeout == 0
            || self.refresh_wait_timeout == 0
        {
            anyhow::bail!("Timeouts must be greater than zero");
        }

        Ok(())
    }

    /// Runtime settings for the API client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.http_connect_timeout),
            request_timeout: Duration::from_secs(self.http_request_timeout),
            refresh_wait: Duration::from_secs(self.refresh_wait_timeout),
        }
    }
}

/// Read a numeric environment variable, falling back to `default`
fn env_or(name: &str, default: u64) -> u64 {
    parse_or(std::env::var(name).ok().as_deref(), default)
}

fn parse_or(value: Option<&str>, default: u64) -> u64 {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// `<data_dir>/loan-agency/credentials.sqlite3`
pub fn default_credentials_db() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("loan-agency").join("credentials.sqlite3"))
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
