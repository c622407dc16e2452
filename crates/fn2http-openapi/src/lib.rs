//! OpenAPI composition utilities for fn2http.
//!
//! This crate provides types and a builder for composing OpenAPI documents from
//! route tables and auth declarations, independently of any HTTP runtime.
//!
//! # Example
//!
//! ```ignore
//! use fn2http_openapi::OpenApiBuilder;
//!
//! let spec = OpenApiBuilder::new()
//!     .title("Calculator API")
//!     .version("1.0.0")
//!     .merge_paths(paths)
//!     .build();
//! ```

mod auth;
mod builder;
mod error;
mod types;

pub use auth::{AuthDeclaration, AuthType, set_auth};
pub use builder::OpenApiBuilder;
pub use error::OpenApiError;
pub use types::*;

/// Result type for OpenAPI operations.
pub type Result<T> = std::result::Result<T, OpenApiError>;
