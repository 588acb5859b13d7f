// Token refresh call

use reqwest::Client;

use super::store::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use super::types::{RefreshRequest, RefreshResponse};
use crate::error::{transport_kind, RefreshError};

/// Refresh endpoint relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// Build the refresh URL for a base URL
pub fn refresh_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH)
}

/// Short, log-safe token prefix
pub fn token_preview(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}

/// Exchange the stored refresh token for a new access token
///
/// Persists the new access token (and a rotated refresh token, when the
/// server sends one) before returning it. Fails without touching the
/// network when no refresh token is stored.
pub async fn refresh_access_token(
    client: &Client,
    url: &str,
    store: &dyn CredentialStore,
) -> Result<String, RefreshError> {
    let refresh_token = store
        .get(REFRESH_TOKEN_KEY)
        .map_err(|e| RefreshError::Store(e.to_string()))?
        .ok_or(RefreshError::MissingRefreshToken)?;

    tracing::info!("Refreshing access token...");

    let response = client
        .post(url)
        .json(&RefreshRequest {
            refresh: &refresh_token,
        })
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error_kind = transport_kind(&e), error = %e, "Refresh request failed");
            RefreshError::Transport(format!("{} (kind: {})", e, transport_kind(&e)))
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %error_text,
            "Token refresh rejected"
        );
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            message: error_text,
        });
    }

    let data: RefreshResponse = response
        .json()
        .await
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    if data.access.is_empty() {
        return Err(RefreshError::InvalidResponse(
            "response does not contain an access token".to_string(),
        ));
    }

    store
        .set(ACCESS_TOKEN_KEY, &data.access)
        .map_err(|e| RefreshError::Store(e.to_string()))?;

    if let Some(ref rotated) = data.refresh {
        store
            .set(REFRESH_TOKEN_KEY, rotated)
            .map_err(|e| RefreshError::Store(e.to_string()))?;
        tracing::debug!("Stored rotated refresh token");
    }

    tracing::info!(
        "Access token refreshed ({}...)",
        token_preview(&data.access)
    );

    Ok(data.access)
}
