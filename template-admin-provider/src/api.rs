//! Outbound contract: the GraphQL API client the gateway talks through.
//!
//! Authentication, retry and caching belong to the client implementation,
//! not to the gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// `errorType` the backend reports when a write carries a stale `_version`.
pub const CONFLICT_ERROR_TYPE: &str = "ConflictUnhandled";

/// One GraphQL request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    pub operation_name: String,
    pub variables: Value,
}

/// One entry of a GraphQL `errors` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlError {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: String,
    /// For conflicts, the record as the backend currently holds it.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error_info: Option<Value>,
}

impl GraphqlError {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error_type: Some(error_type.to_string()),
            message: message.to_string(),
            ..Default::default()
        }
    }

    /// True when the backend rejected a write because of a version mismatch.
    pub fn is_conflict(&self) -> bool {
        self.error_type.as_deref() == Some(CONFLICT_ERROR_TYPE)
    }
}

/// Why a request produced no `data`.
#[derive(Debug, Clone, Error)]
pub enum ApiFailure {
    /// The backend answered with a GraphQL error list.
    #[error("request rejected: {}", .0.first().map(|e| e.message.as_str()).unwrap_or("no error detail"))]
    Rejected(Vec<GraphqlError>),

    /// No usable answer came back.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A GraphQL endpoint.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Sends one request. On success returns the response's `data` object.
    async fn request(&self, request: GraphqlRequest) -> Result<Value, ApiFailure>;
}

#[async_trait]
impl<T: ApiClient + ?Sized> ApiClient for Arc<T> {
    async fn request(&self, request: GraphqlRequest) -> Result<Value, ApiFailure> {
        (**self).request(request).await
    }
}
