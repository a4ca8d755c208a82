//! Error types for schema loading and lookup.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading or querying schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No schema is registered under the requested resource name.
    #[error("undefined entity \"{0}\"")]
    UnknownResource(String),

    /// The schema document is not valid JSON or has the wrong shape.
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The schema file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document parsed but is not usable (e.g. duplicate plural names).
    #[error("invalid schema: {0}")]
    Invalid(String),
}
