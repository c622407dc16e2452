//! Error taxonomy: fatal build-time errors and recoverable request-time errors.

use std::fmt;

use thiserror::Error;

/// Errors raised while assembling an app. All of these are fatal: app
/// assembly must not complete once one is raised.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The callable exposes no readable signature metadata.
    #[error("callable '{name}' exposes no signature metadata")]
    Introspection { name: String },

    /// Two parameter definitions collided and the policy forbids resolving it.
    #[error("parameter collision on '{name}': {message}")]
    ParameterCollision { name: String, message: String },

    /// Two routes resolved to the same (method, path) pair.
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    /// A named parameter was absent from the source signature.
    #[error("parameter '{name}' not found in source signature")]
    ParameterNotFound { name: String },

    /// A variadic parameter reached an operation that cannot handle it.
    #[error("parameter '{name}' has unsupported kind {kind}")]
    UnsupportedParameterKind { name: String, kind: String },

    /// A parameter sequence violates signature invariants.
    #[error("invalid signature: {message}")]
    Signature { message: String },

    /// A required config key is missing from every level of the chain.
    #[error("missing configuration value for '{key}'")]
    Configuration { key: String },
}

/// Category of a handler failure, mapped to an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// 400 Bad Request
    InvalidInput,
    /// 401 Unauthorized
    Unauthenticated,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 409 Conflict
    Conflict,
    /// 500 Internal Server Error
    Internal,
}

impl ErrorCode {
    /// Convert to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::Unauthenticated => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::Internal => 500,
        }
    }
}

/// An error raised by a wrapped callable at request time.
///
/// Carries a category (for status mapping), a client-visible message, and the
/// original error's type name, which the default error handler only exposes
/// when debug errors are enabled.
#[derive(Debug, Clone)]
pub struct HandlerError {
    code: ErrorCode,
    message: String,
    type_name: String,
}

impl HandlerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            type_name: "HandlerError".to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Record the original error's type name (e.g. "DivisionByZero").
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl std::error::Error for HandlerError {}

/// A request body or argument set that fails the derived schema.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("missing required argument '{name}'")]
    MissingRequired { name: String },

    #[error("argument '{name}' does not match expected type {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("argument '{name}' is not one of the allowed values")]
    NotInEnum { name: String },

    #[error("request body is not a JSON object: {message}")]
    InvalidBody { message: String },
}

/// The output mapper could not encode a return value as JSON.
#[derive(Debug, Clone, Error)]
#[error("cannot serialize value of type '{type_name}' to JSON")]
pub struct SerializationError {
    pub type_name: String,
}

/// Any request-time failure. Always converted to a [`Response`] by the
/// route's error handler, never propagated to the transport layer.
///
/// [`Response`]: crate::request::Response
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl RequestError {
    /// HTTP status the default error handler uses for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            RequestError::Validation(_) => 400,
            RequestError::Serialization(_) => 500,
            RequestError::Handler(err) => err.code().http_status(),
        }
    }

    /// Name of the underlying error type, for debug-mode responses.
    pub fn type_name(&self) -> &str {
        match self {
            RequestError::Validation(_) => "ValidationError",
            RequestError::Serialization(_) => "SerializationError",
            RequestError::Handler(err) => err.type_name(),
        }
    }
}
