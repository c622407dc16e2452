//! The request/response surface exchanged with the serving layer.
//!
//! Built on the framework-agnostic `http` types. The serving layer hands a
//! [`Request`] to a route's handler function and sends whatever [`Response`]
//! comes back; nothing here touches sockets.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An incoming HTTP request as seen by the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add a header (panics on invalid names/values; intended for tests and
    /// adapters that already hold parsed headers).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name: http::header::HeaderName = name.parse().expect("invalid header name");
        let value: http::header::HeaderValue = value.parse().expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_vec(body).unwrap_or_default();
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Parse the body as JSON. An empty body parses to `None`.
    pub fn parsed_json(&self) -> Result<Option<Value>, ValidationError> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&self.body)
            .map(Some)
            .map_err(|err| ValidationError::InvalidBody {
                message: err.to_string(),
            })
    }
}

/// An outgoing HTTP response handed back to the serving layer.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    /// A JSON response with the given status.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, JSON_CONTENT_TYPE.parse().expect("static value"));
        Self {
            status,
            headers,
            body: serde_json::to_vec(body).unwrap_or_default(),
        }
    }

    /// 200 OK with a JSON body.
    pub fn ok_json<T: Serialize>(body: &T) -> Self {
        Self::json(StatusCode::OK, body)
    }

    /// A JSON error body of the shape `{"error": message}`.
    pub fn error_json(status: StatusCode, message: &str) -> Self {
        Self::json(status, &serde_json::json!({"error": message}))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<http::header::HeaderName>(),
            value.parse::<http::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Parse the body as JSON (test helper).
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
