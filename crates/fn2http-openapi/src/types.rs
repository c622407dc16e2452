//! Typed OpenAPI structures.
//!
//! These types represent the subset of OpenAPI 3.0 that fn2http emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An OpenAPI path with its operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenApiPath {
    /// The path pattern (e.g., "/users/{id}").
    pub path: String,
    /// HTTP method (lowercase: "get", "post", etc.).
    pub method: String,
    /// The operation definition.
    pub operation: OpenApiOperation,
}

/// An OpenAPI operation (endpoint).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenApiOperation {
    /// Short summary of the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Unique operation identifier.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Operation parameters (query/header bound).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<OpenApiParameter>,
    /// Request body definition.
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Response definitions keyed by status code.
    #[serde(default)]
    pub responses: serde_json::Map<String, Value>,
    /// Additional fields not explicitly modeled (e.g. "x-method-name").
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// An OpenAPI parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenApiParameter {
    /// Parameter name.
    pub name: String,
    /// Location: "path", "query", "header", or "cookie".
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Parameter schema.
    #[serde(default)]
    pub schema: Value,
    /// Parameter description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named schema destined for components/schemas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenApiSchema {
    /// Schema name (used as key in components/schemas).
    pub name: String,
    /// The schema definition.
    pub schema: Value,
}

/// A security scheme entry for components/securitySchemes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityScheme {
    /// Scheme type: "apiKey" or "http".
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// HTTP auth scheme name (for type = "http").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Bearer token format (for scheme = "bearer").
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// Key location (for type = "apiKey"): "header", "query", or "cookie".
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Key name (for type = "apiKey").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OpenApiPath {
    /// Create a new path.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into().to_lowercase(),
            operation: OpenApiOperation::default(),
        }
    }

    /// Set the operation for this path.
    pub fn with_operation(mut self, operation: OpenApiOperation) -> Self {
        self.operation = operation;
        self
    }
}

impl Default for OpenApiOperation {
    fn default() -> Self {
        Self {
            summary: None,
            operation_id: None,
            parameters: Vec::new(),
            request_body: None,
            responses: serde_json::Map::new(),
            extra: serde_json::Map::new(),
        }
    }
}

impl OpenApiOperation {
    /// Create a new operation with a summary.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    /// Set the operation ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, param: OpenApiParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Set the request body.
    pub fn with_request_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Add a response.
    pub fn with_response(mut self, status: impl Into<String>, response: Value) -> Self {
        self.responses.insert(status.into(), response);
        self
    }

    /// Add an extension field (e.g. "x-method-name").
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl OpenApiParameter {
    /// Create a query parameter.
    pub fn query(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            location: "query".to_string(),
            required,
            schema: serde_json::json!({"type": "string"}),
            description: None,
        }
    }

    /// Create a header parameter.
    pub fn header(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            location: "header".to_string(),
            required,
            schema: serde_json::json!({"type": "string"}),
            description: None,
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

impl OpenApiSchema {
    /// Create a new schema.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

impl SecurityScheme {
    /// An API-key scheme reading the given header.
    pub fn api_key(header_name: impl Into<String>) -> Self {
        Self {
            scheme_type: "apiKey".to_string(),
            scheme: None,
            bearer_format: None,
            location: Some("header".to_string()),
            name: Some(header_name.into()),
            description: None,
        }
    }

    /// An HTTP bearer scheme carrying a JWT.
    pub fn bearer_jwt() -> Self {
        Self {
            scheme_type: "http".to_string(),
            scheme: Some("bearer".to_string()),
            bearer_format: Some("JWT".to_string()),
            location: None,
            name: None,
            description: None,
        }
    }
}
