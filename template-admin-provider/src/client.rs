//! HTTP implementation of [`ApiClient`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiClient, ApiFailure, GraphqlError, GraphqlRequest};
use crate::error::{ProviderError, ProviderResult};

/// Where and how to reach the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Sent as `x-api-key` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:20002/graphql".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

/// Posts GraphQL requests as JSON over HTTP.
pub struct HttpApiClient {
    config: ApiConfig,
    client: Client,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn request(&self, request: GraphqlRequest) -> Result<Value, ApiFailure> {
        debug!("GraphQL {} -> {}", request.operation_name, self.config.endpoint);

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiFailure::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiFailure::Transport(format!("read response body failed: {e}")))?;

        let parsed: GraphqlResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ApiFailure::Transport(format!("HTTP {status}: {body}")));
            }
            Err(e) => {
                return Err(ApiFailure::Transport(format!("failed to parse response: {e}")));
            }
        };

        if !parsed.errors.is_empty() {
            return Err(ApiFailure::Rejected(parsed.errors));
        }
        if !status.is_success() {
            return Err(ApiFailure::Transport(format!("HTTP {status}")));
        }

        Ok(parsed.data.unwrap_or(Value::Null))
    }
}
