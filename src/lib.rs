// Loan agency client - library root

pub mod auth;
pub mod config;
pub mod display;
pub mod error;
pub mod http_client;
pub mod models;
pub mod services;

pub use error::{NetworkError, RefreshError, StoreError};
pub use http_client::{ApiClient, FileUpload, RequestConfig};
