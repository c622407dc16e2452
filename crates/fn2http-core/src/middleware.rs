//! Sub-app middleware wrapping route dispatch.

use std::sync::Arc;

use http::StatusCode;

use crate::request::{Request, Response};
use crate::route::RouteSpec;

/// Wraps dispatch for every route of a sub-app.
///
/// Call `next.run(req)` to continue down the chain; return early to
/// short-circuit (e.g. reject unauthenticated requests).
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &Request, next: Next<'_>) -> Response;
}

/// The remainder of a middleware chain, ending at the route itself.
pub struct Next<'a> {
    route: &'a RouteSpec,
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(route: &'a RouteSpec, rest: &'a [Arc<dyn Middleware>]) -> Self {
        Self { route, rest }
    }

    pub fn run(self, req: &Request) -> Response {
        match self.rest.split_first() {
            Some((middleware, rest)) => middleware.handle(req, Next::new(self.route, rest)),
            None => self.route.dispatch(req),
        }
    }
}

/// Rejects requests whose `Authorization` header doesn't match the key.
///
/// This is a plain string comparison; no token cryptography is involved.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl ApiKeyAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl Middleware for ApiKeyAuth {
    fn handle(&self, req: &Request, next: Next<'_>) -> Response {
        if req.header_str("authorization") == Some(self.api_key.as_str()) {
            next.run(req)
        } else {
            Response::error_json(StatusCode::UNAUTHORIZED, "invalid API key")
        }
    }
}

/// Adds permissive CORS headers to every response.
#[derive(Debug, Clone)]
pub struct Cors {
    origins: String,
}

impl Cors {
    pub fn new(origins: impl Into<String>) -> Self {
        Self {
            origins: origins.into(),
        }
    }

    pub fn any() -> Self {
        Self::new("*")
    }
}

impl Middleware for Cors {
    fn handle(&self, req: &Request, next: Next<'_>) -> Response {
        next.run(req)
            .with_header("Access-Control-Allow-Origin", &self.origins)
            .with_header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE")
            .with_header(
                "Access-Control-Allow-Headers",
                "Origin, Accept, Content-Type, Authorization",
            )
    }
}
