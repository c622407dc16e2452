//! Error types for OpenAPI composition.

use thiserror::Error;

/// Errors that can occur during OpenAPI composition.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// Schema conflict: same name, different definitions.
    #[error("Schema conflict for '{name}': defined differently in multiple specs")]
    SchemaConflict { name: String },

    /// Invalid OpenAPI document structure.
    #[error("Invalid OpenAPI document: {message}")]
    InvalidDocument { message: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
