// Authentication module
// Credential storage, token refresh and session handling

pub mod coordinator;
pub mod refresh;
pub mod session;
pub mod store;
mod types;

pub use session::{AuthService, Session};
pub use store::{CredentialStore, MemoryStore, SqliteStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
pub use types::{AuthResponse, SignInData, SignUpData, TokenPair, User};
