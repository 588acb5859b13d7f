// Authentication types

use serde::{Deserialize, Serialize};

/// Access/refresh credential pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Refresh request body
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh response body
///
/// `refresh` is only present when the server rotates refresh tokens.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Sign-in form
#[derive(Debug, Clone, Serialize)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

/// Sign-up form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpData {
    pub last_name: String,
    pub middle_name: String,
    pub first_name: String,
    pub country: String,
    pub phone_number: String,
    pub password: String,
}

/// Authenticated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub phone_number: String,
}

/// Response of the login and register endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub tokens: TokenPair,
    pub user: User,
}
