// Account operations and the signed-in session

use serde_json::{json, Value};
use std::sync::Arc;

use super::store::{clear_tokens, save_tokens, ACCESS_TOKEN_KEY};
use super::types::{AuthResponse, SignInData, SignUpData, User};
use crate::error::Result;
use crate::http_client::ApiClient;

/// Authentication endpoints; persists tokens on sign-in and sign-up
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn sign_in(&self, credentials: &SignInData) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .api
            .post("/auth/login/", Some(credentials), None)
            .await?;
        save_tokens(self.api.store().as_ref(), &response.tokens)?;
        tracing::info!(user_id = response.user.id, "Signed in");
        Ok(response)
    }

    pub async fn sign_up(&self, data: &SignUpData) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .api
            .post("/auth/register/", Some(data), None)
            .await?;
        save_tokens(self.api.store().as_ref(), &response.tokens)?;
        tracing::info!(user_id = response.user.id, "Account created");
        Ok(response)
    }

    /// Delete both stored tokens
    pub fn sign_out(&self) -> Result<()> {
        clear_tokens(self.api.store().as_ref())?;
        tracing::info!("Signed out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User> {
        self.api.get("/auth/me/", None).await
    }

    pub async fn verify_phone(&self, phone_number: &str) -> Result<()> {
        let _: Value = self
            .api
            .post(
                "/auth/verify-phone/",
                Some(&json!({ "phoneNumber": phone_number })),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn verify_code(&self, phone_number: &str, code: &str) -> Result<()> {
        let _: Value = self
            .api
            .post(
                "/auth/verify-code/",
                Some(&json!({ "phoneNumber": phone_number, "code": code })),
                None,
            )
            .await?;
        Ok(())
    }

    fn has_access_token(&self) -> bool {
        match self.api.store().get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stored access token");
                false
            }
        }
    }
}

/// The signed-in user, if any
pub struct Session {
    auth: AuthService,
    user: Option<User>,
}

impl Session {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthService::new(api),
            user: None,
        }
    }

    /// Load the user behind a stored token
    ///
    /// Any failure signs out, so a broken session never lingers.
    pub async fn restore(&mut self) -> Option<&User> {
        if !self.auth.has_access_token() {
            return None;
        }

        match self.auth.current_user().await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, "Restored session");
                self.user = Some(user);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load user");
                if let Err(e) = self.auth.sign_out() {
                    tracing::error!(error = %e, "Sign out error");
                }
                self.user = None;
            }
        }

        self.user.as_ref()
    }

    pub async fn sign_in(&mut self, credentials: &SignInData) -> Result<&User> {
        let response = self.auth.sign_in(credentials).await?;
        Ok(&*self.user.insert(response.user))
    }

    pub async fn sign_up(&mut self, data: &SignUpData) -> Result<&User> {
        let response = self.auth.sign_up(data).await?;
        Ok(&*self.user.insert(response.user))
    }

    /// Forget the user even if clearing the store fails
    pub fn sign_out(&mut self) -> Result<()> {
        self.user = None;
        self.auth.sign_out()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
