// Applicant directory service

use std::sync::Arc;

use crate::error::Result;
use crate::http_client::{ApiClient, RequestConfig};
use crate::models::{UserFilters, UserProfile};

pub struct UsersService {
    api: Arc<ApiClient>,
}

impl UsersService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// List profiles, filtered by status and/or search text
    pub async fn list(&self, filters: &UserFilters) -> Result<Vec<UserProfile>> {
        self.api
            .get("/users/", Some(filter_query(filters)))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<UserProfile> {
        self.api.get(&format!("/users/{}/", id), None).await
    }

    /// Partial update; `patch` carries only the fields to change
    pub async fn update(&self, id: u64, patch: &serde_json::Value) -> Result<UserProfile> {
        self.api
            .patch(&format!("/users/{}/", id), Some(patch), None)
            .await
    }
}

fn filter_query(filters: &UserFilters) -> RequestConfig {
    let mut config = RequestConfig::new();
    if let Some(status) = filters.status {
        config = config.query("status", status.as_str());
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
        config = config.query("search", search);
    }
    config
}
