// Error handling module
// Defines the client-facing error taxonomy

use thiserror::Error;

/// Errors raised by a credential store backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Backend could not be opened or initialized
    #[error("Failed to open credential store: {0}")]
    Open(String),

    /// Read or write against the backend failed
    #[error("Credential store I/O failed: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Why a refresh cycle failed
///
/// Cloneable so a single failure can be delivered to every request queued
/// behind the refresh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    /// No refresh credential in the store; the network was not contacted
    #[error("No refresh token")]
    MissingRefreshToken,

    /// Refresh endpoint answered with a non-2xx status
    #[error("Refresh rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Refresh call never completed
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// Refresh endpoint answered 2xx with an unusable body
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// New credential could not be persisted
    #[error("Failed to persist refreshed token: {0}")]
    Store(String),

    /// The task driving the refresh went away before it settled
    #[error("Refresh was abandoned before completing")]
    Abandoned,
}

/// Errors returned by every [`crate::http_client::ApiClient`] operation
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Request never reached or returned from the server
    #[error("Transport error ({kind}): {message}")]
    Transport { kind: &'static str, message: String },

    /// 401 on a request that was already replayed after a refresh
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Refresh call failed; the stored session has been cleared
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Waited too long for another request's refresh to settle
    #[error("Timed out after {waited_secs}s waiting for token refresh")]
    RefreshTimeout { waited_secs: u64 },

    /// Non-2xx response other than a refreshable 401
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// 2xx response whose payload could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Credential store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl NetworkError {
    /// Build a transport error from a reqwest failure, categorizing its kind
    pub fn from_transport(err: &reqwest::Error) -> Self {
        NetworkError::Transport {
            kind: transport_kind(err),
            message: err.to_string(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Server { status, .. } => Some(*status),
            NetworkError::Unauthorized { .. } => Some(401),
            NetworkError::RefreshFailed(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True when the caller must send the user back to sign-in
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            NetworkError::Unauthorized { .. } | NetworkError::RefreshFailed(_)
        )
    }
}

/// Categorize a reqwest error for logging and error reporting
pub fn transport_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection_failed"
    } else if err.is_request() {
        "request_error"
    } else if err.is_body() {
        "body_error"
    } else if err.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, NetworkError>;
