// Loan application service

use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::LoanApplicationData;

pub struct ApplicationsService {
    api: Arc<ApiClient>,
}

impl ApplicationsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn submit(&self, data: &LoanApplicationData) -> Result<Value> {
        self.api.post("/applications/", Some(data), None).await
    }

    pub async fn get(&self, id: u64) -> Result<Value> {
        self.api.get(&format!("/applications/{}/", id), None).await
    }

    /// Applications submitted by the signed-in user
    pub async fn mine(&self) -> Result<Vec<Value>> {
        self.api.get("/applications/my/", None).await
    }
}
