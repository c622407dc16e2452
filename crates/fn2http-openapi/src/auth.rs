//! Declarative auth schemes attached to a generated OpenAPI document.
//!
//! Nothing here issues or verifies tokens; these types only describe an auth
//! scheme so that clients generated from the document know how to present
//! credentials and where the login/refresh endpoints live.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::types::SecurityScheme;

/// The kind of authentication an API document declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// A static API key presented in a header.
    ApiKey,
    /// A login/refresh token flow (bearer JWT).
    Login,
}

/// Declarative description of an auth scheme for an API document.
///
/// For [`AuthType::Login`], `login_url`/`refresh_url` and their input schemas
/// are documented as operations in the emitted spec. They are not real routes;
/// the serving deployment is expected to provide them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthDeclaration {
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_input_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_input_schema: Option<Value>,
}

impl AuthDeclaration {
    /// Declare a header API key scheme.
    pub fn api_key() -> Self {
        Self {
            auth_type: AuthType::ApiKey,
            login_url: None,
            refresh_url: None,
            login_input_schema: None,
            refresh_input_schema: None,
        }
    }

    /// Declare a login/refresh bearer-token scheme.
    pub fn login(login_url: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Login,
            login_url: Some(login_url.into()),
            refresh_url: None,
            login_input_schema: None,
            refresh_input_schema: None,
        }
    }

    /// Set the refresh endpoint URL.
    pub fn with_refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = Some(url.into());
        self
    }

    /// Set the login endpoint's input schema (an object schema).
    pub fn with_login_input_schema(mut self, schema: Value) -> Self {
        self.login_input_schema = Some(schema);
        self
    }

    /// Set the refresh endpoint's input schema (an object schema).
    pub fn with_refresh_input_schema(mut self, schema: Value) -> Self {
        self.refresh_input_schema = Some(schema);
        self
    }
}

/// Augment an OpenAPI document with the declared auth scheme.
///
/// Inserts `components.securitySchemes` and a document-level `security`
/// requirement. For login auth, also documents the login and refresh
/// endpoints under `paths`.
pub fn set_auth(spec: &mut Value, auth: &AuthDeclaration) {
    let (scheme_name, scheme) = match auth.auth_type {
        AuthType::ApiKey => ("apiKey", SecurityScheme::api_key("Authorization")),
        AuthType::Login => ("bearerAuth", SecurityScheme::bearer_jwt()),
    };

    let root = match spec.as_object_mut() {
        Some(root) => root,
        None => return,
    };

    let components = root
        .entry("components".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(components) = components.as_object_mut() {
        let schemes = components
            .entry("securitySchemes".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(schemes) = schemes.as_object_mut() {
            schemes.insert(
                scheme_name.to_string(),
                serde_json::to_value(&scheme).unwrap_or(Value::Null),
            );
        }
    }

    root.insert("security".to_string(), json!([{scheme_name: []}]));

    if auth.auth_type == AuthType::Login {
        let paths = root
            .entry("paths".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(paths) = paths.as_object_mut() {
            if let Some(url) = &auth.login_url {
                paths.insert(
                    url.clone(),
                    token_endpoint_doc("Obtain an access token", &auth.login_input_schema),
                );
            }
            if let Some(url) = &auth.refresh_url {
                paths.insert(
                    url.clone(),
                    token_endpoint_doc("Refresh an access token", &auth.refresh_input_schema),
                );
            }
        }
    }
}

fn token_endpoint_doc(summary: &str, input_schema: &Option<Value>) -> Value {
    let schema = input_schema
        .clone()
        .unwrap_or_else(|| json!({"type": "object"}));
    json!({
        "post": {
            "summary": summary,
            "security": [],
            "requestBody": {
                "required": true,
                "content": {"application/json": {"schema": schema}}
            },
            "responses": {
                "200": {
                    "description": "Token response",
                    "content": {"application/json": {"schema": {"type": "object"}}}
                }
            }
        }
    })
}
