use anyhow::{Context, Result as AnyResult};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{multipart, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::coordinator::{RefreshCoordinator, RefreshTicket};
use crate::auth::refresh;
use crate::auth::store::{clear_tokens, CredentialStore, ACCESS_TOKEN_KEY};
use crate::config::ClientConfig;
use crate::error::{transport_kind, NetworkError, Result};

/// Per-call options: extra headers and query parameters
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Binary payload sent as the `file` field of a multipart form
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime: String,
}

impl FileUpload {
    pub fn new(bytes: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            bytes: bytes.into(),
            mime: guess_mime(&file_name).to_string(),
            file_name,
        }
    }

    /// Read a file from disk
    pub fn from_path(path: &Path) -> AnyResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read upload file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(bytes, file_name))
    }

    fn to_form(&self) -> Result<multipart::Form> {
        let part = multipart::Part::stream(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime)
            .map_err(|e| NetworkError::InvalidRequest(format!("invalid mime type: {}", e)))?;
        Ok(multipart::Form::new().part("file", part))
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    File(FileUpload),
}

/// Whether a request is on its first send or its replay after a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

/// Everything needed to (re)issue one call
#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    path: String,
    body: RequestBody,
    config: RequestConfig,
    attempt: Attempt,
}

impl ApiRequest {
    fn new(method: Method, path: &str, body: RequestBody, config: Option<RequestConfig>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            config: config.unwrap_or_default(),
            attempt: Attempt::First,
        }
    }

    /// Same request, tagged as the single replay after a refresh
    fn into_retry(self) -> Self {
        Self {
            attempt: Attempt::Retry,
            ..self
        }
    }
}

/// HTTP client for the loan agency API
///
/// Attaches the stored access token to every call and renews it on 401:
/// - the first request to see a 401 refreshes the token
/// - requests hitting 401 during that refresh wait for its outcome
/// - every such request is replayed once with the new token
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// API root, without trailing slash
    base_url: String,

    refresh_url: String,

    /// Secure storage for the token pair
    store: Arc<dyn CredentialStore>,

    /// Refresh-in-progress flag and pending queue
    coordinator: RefreshCoordinator,

    /// Upper bound on waiting for another request's refresh
    refresh_wait: Duration,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> AnyResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            refresh_url: refresh::refresh_url(&base_url),
            base_url,
            store,
            coordinator: RefreshCoordinator::new(),
            refresh_wait: config.refresh_wait,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential store backing this client
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Whether a token refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        self.execute(ApiRequest::new(Method::GET, path, RequestBody::Empty, config))
            .await
    }

    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(ApiRequest::new(Method::POST, path, body, config))
            .await
    }

    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(ApiRequest::new(Method::PUT, path, body, config))
            .await
    }

    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.execute(ApiRequest::new(Method::PATCH, path, body, config))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        self.execute(ApiRequest::new(Method::DELETE, path, RequestBody::Empty, config))
            .await
    }

    /// POST a file as `multipart/form-data`
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FileUpload,
        config: Option<RequestConfig>,
    ) -> Result<T> {
        self.execute(ApiRequest::new(
            Method::POST,
            path,
            RequestBody::File(file),
            config,
        ))
        .await
    }

    /// Send a request, refreshing the access token and replaying once on 401
    async fn execute<T: DeserializeOwned>(&self, mut request: ApiRequest) -> Result<T> {
        let mut token = self.store.get(ACCESS_TOKEN_KEY)?;

        loop {
            let response = self.send(&request, token.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return decode(response).await;
            }

            if request.attempt == Attempt::Retry {
                let message = response.text().await.unwrap_or_default();
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    "Received 401 after token refresh, giving up"
                );
                return Err(NetworkError::Unauthorized { message });
            }

            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "Received 401, renewing access token"
            );
            token = Some(self.renew_access_token().await?);
            request = request.into_retry();
        }
    }

    /// Obtain a fresh access token, either by refreshing or by waiting on
    /// the refresh already in flight
    async fn renew_access_token(&self) -> Result<String> {
        let guard = match self.coordinator.begin() {
            RefreshTicket::Follower(pending) => return pending.wait(self.refresh_wait).await,
            RefreshTicket::Leader(guard) => guard,
        };

        let outcome =
            refresh::refresh_access_token(&self.client, &self.refresh_url, self.store.as_ref())
                .await;

        // Clear tokens while the flag is still set
        if let Err(ref e) = outcome {
            tracing::error!(error = %e, "Token refresh failed, clearing stored session");
            if let Err(store_err) = clear_tokens(self.store.as_ref()) {
                tracing::error!(error = %store_err, "Failed to clear stored tokens");
            }
        }
        guard.settle(&outcome);

        outcome.map_err(NetworkError::RefreshFailed)
    }

    /// Transmit one attempt
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = self.url_for(&request.path);

        tracing::debug!(
            method = %request.method,
            url = %url,
            attempt = ?request.attempt,
            authenticated = token.is_some(),
            "Sending HTTP request"
        );

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.config.query.is_empty() {
            builder = builder.query(&request.config.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File(file) => builder.multipart(file.to_form()?),
        };

        builder = builder.headers(build_headers(&request.config.headers, token)?);

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                error_kind = transport_kind(&e),
                error = %e,
                url = %url,
                "HTTP request error"
            );
            NetworkError::from_transport(&e)
        })?;

        tracing::debug!(status = %response.status(), "Received HTTP response");
        Ok(response)
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn json_body<B: Serialize + ?Sized>(body: Option<&B>) -> Result<RequestBody> {
    match body {
        None => Ok(RequestBody::Empty),
        Some(body) => serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| NetworkError::InvalidRequest(format!("unserializable body: {}", e))),
    }
}

/// Per-call headers plus the bearer token, which always wins
fn build_headers(custom: &[(String, String)], token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in custom {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| NetworkError::InvalidRequest(format!("header {}: {}", name, e)))?;
        headers.insert(name, value);
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| NetworkError::InvalidRequest(format!("access token: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

/// Turn a response into the decoded payload or a `Server`/`Decode` error
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            url = %url,
            response_body = %message,
            "HTTP request failed with error response"
        );
        return Err(NetworkError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| NetworkError::from_transport(&e))?;

    // Empty bodies (204, most DELETEs) decode as JSON null
    let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(body).map_err(|e| NetworkError::Decode(e.to_string()))
}
