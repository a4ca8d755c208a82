//! Error types for the data provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use template_admin_model::{Record, SchemaError};
use thiserror::Error;

/// Result type for data provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// One field whose submitted value differs from what the backend now holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub submitted: Value,
    pub current: Value,
}

/// Payload of a rejected write whose `_version` was stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetails {
    /// The backend's own message.
    pub message: String,
    /// The record as the backend holds it, when the rejection carried it.
    pub server_record: Option<Record>,
    /// Submitted fields whose values differ from `server_record`.
    pub diff: BTreeMap<String, FieldDiff>,
}

/// Errors surfaced by the data provider.
///
/// Gateway errors reach the caller unmodified; nothing in this crate retries.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The resource name has no schema.
    #[error("undefined entity \"{0}\"")]
    UnknownResource(String),

    /// The record does not exist.
    #[error("{resource} record not found: {id}")]
    NotFound { resource: String, id: String },

    /// Another writer changed the record since it was read.
    #[error(
        "another user has changed this record; please reconcile and try again. ({})",
        .0.message
    )]
    Conflict(ConflictDetails),

    /// The backend rejected the request for any other reason.
    #[error("{message}")]
    Remote {
        message: String,
        status: u16,
        data: Option<Value>,
    },

    /// The filter is neither a predicate nor a field mapping.
    #[error("unsupported filter type: {0}")]
    UnsupportedFilter(String),

    /// Operation parameters are missing or malformed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// No decodable answer came back from the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The schema document could not be loaded.
    #[error("schema error: {0}")]
    Schema(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// The HTTP-style status this error reports to the presentation layer.
    pub fn status(&self) -> u16 {
        match self {
            ProviderError::UnknownResource(_) | ProviderError::NotFound { .. } => 404,
            ProviderError::Conflict(_) => 409,
            ProviderError::Remote { status, .. } => *status,
            ProviderError::UnsupportedFilter(_)
            | ProviderError::InvalidParams(_)
            | ProviderError::Serialization(_) => 400,
            ProviderError::Transport(_) => 502,
            ProviderError::Schema(_) => 500,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProviderError::Conflict(_))
    }

    /// Conflict payload, if this is a conflict.
    pub fn conflict(&self) -> Option<&ConflictDetails> {
        match self {
            ProviderError::Conflict(details) => Some(details),
            _ => None,
        }
    }
}

impl From<SchemaError> for ProviderError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownResource(resource) => ProviderError::UnknownResource(resource),
            other => ProviderError::Schema(other.to_string()),
        }
    }
}
