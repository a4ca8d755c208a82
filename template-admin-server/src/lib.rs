//! HTTP API for the Template admin data provider.
//!
//! `POST /api/v1/{resource}/{operation}` takes the operation's JSON
//! parameters as the body and answers with the provider's `{data, total?}`
//! envelope. `GET /api/v1/schema` lists the registered resources.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use template_admin_provider::{DataProvider, Envelope, ProviderError};
use tracing::{debug, warn};

/// Registered resources and the schema fingerprint they were loaded from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub version: String,
    pub resources: Vec<String>,
}

/// A provider error on its way to the client.
#[derive(Debug)]
pub struct ApiError(ProviderError);

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self(err)
    }
}

/// Stable machine-readable name for each error kind.
fn error_code(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::UnknownResource(_) => "unknown_resource",
        ProviderError::NotFound { .. } => "not_found",
        ProviderError::Conflict(_) => "conflict",
        ProviderError::Remote { .. } => "remote",
        ProviderError::UnsupportedFilter(_) => "unsupported_filter",
        ProviderError::InvalidParams(_) | ProviderError::Serialization(_) => "invalid_params",
        ProviderError::Transport(_) => "transport",
        ProviderError::Schema(_) => "schema",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status, err);
        }

        let body = match &err {
            ProviderError::Conflict(details) => json!({
                "error": error_code(&err),
                "message": err.to_string(),
                "serverRecord": details.server_record,
                "serverChangedAt": details
                    .server_record
                    .as_ref()
                    .and_then(|r| r.last_changed_at())
                    .map(|at| at.to_rfc3339()),
                "diff": details.diff,
            }),
            ProviderError::Remote {
                data: Some(data), ..
            } => json!({
                "error": error_code(&err),
                "message": err.to_string(),
                "data": data,
            }),
            _ => json!({
                "error": error_code(&err),
                "message": err.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

async fn operation_handler(
    State(provider): State<Arc<DataProvider>>,
    Path((resource, operation)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    debug!("POST {}/{} ({} byte body)", resource, operation, body.len());

    let params = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidParams(format!("request body: {e}")))?
    };

    let envelope: Option<Envelope> = provider.execute_raw(&operation, &resource, params).await?;
    Ok(match envelope {
        Some(envelope) => Json(envelope).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown operation \"{operation}\"") })),
        )
            .into_response(),
    })
}

async fn schema_handler(State(provider): State<Arc<DataProvider>>) -> Json<SchemaSummary> {
    let registry = provider.registry();
    Json(SchemaSummary {
        version: registry.version().to_string(),
        resources: registry.resources().into_iter().map(str::to_string).collect(),
    })
}

/// Build the HTTP API router over the given provider.
pub fn build_router(provider: Arc<DataProvider>) -> Router {
    Router::new()
        .route("/api/v1/schema", get(schema_handler))
        .route("/api/v1/{resource}/{operation}", post(operation_handler))
        .with_state(provider)
}
