//! fn2http - dispatch plain callables as HTTP endpoints.
//!
//! fn2http takes a **callable-first** approach: declare your functions with
//! explicit signatures, and the pipeline turns them into routes, a request
//! dispatcher, and an OpenAPI document.
//!
//! # Quick Start
//!
//! ```ignore
//! use fn2http::prelude::*;
//!
//! let add = FnEndpoint::new(
//!     "add",
//!     Signature::new(vec![
//!         Parameter::required("a").hint(TypeHint::Number),
//!         Parameter::with_default("b", 0),
//!     ])?,
//!     |args| {
//!         let a = args.require("a")?.as_f64().unwrap_or(0.0);
//!         let b = args.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
//!         Ok(serde_json::json!(a + b))
//!     },
//! );
//!
//! let config = Config::new().set_global("publish_openapi", true);
//! let app = build_app(vec![SubAppSpec::new("calc").endpoint(add)], &config)?;
//! ```
//!
//! This generates:
//! - **Routes**: `POST /add` (plus `GET /ping`, and `GET /openapi` when
//!   published), exported as a route table of (method, path, handler) triples.
//! - **Validation**: a per-parameter schema derived from the signature;
//!   requests that fail it get a JSON 400.
//! - **OpenAPI**: a 3.0 document emitted from the route table, with optional
//!   declarative auth via [`AuthDeclaration`].
//!
//! # Serving
//!
//! With the `http` feature (default), [`serve::into_router`] turns an
//! assembled app into an `axum::Router`, and [`serve::serve`] runs it:
//!
//! ```ignore
//! let router = fn2http::serve::into_router(std::sync::Arc::new(app));
//! fn2http::serve::serve(router, "127.0.0.1:3030").await?;
//! ```
//!
//! The core never touches sockets; disable default features to use the route
//! table with your own serving layer.
//!
//! # Composition
//!
//! Decorators inject parameters and hooks while keeping the effective
//! signature accurate ([`decorate`], [`DecoratorStack`]), and [`flatten`]
//! merges several callables into one composite endpoint dispatched by a key
//! parameter.

// Re-export core types
pub use fn2http_core::*;

// Re-export the OpenAPI composition surface
pub use fn2http_openapi::{
    AuthDeclaration, AuthType, OpenApiBuilder, OpenApiError, OpenApiOperation, OpenApiParameter,
    OpenApiPath, OpenApiSchema, SecurityScheme, set_auth,
};

// Re-export serde for user callables
pub use serde;
pub use serde_json;

#[cfg(feature = "http")]
pub mod serve;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        App, AuthDeclaration, AuthType, CallArgs, CallOutput, Callable, Config, Decorator,
        DecoratorStack, FlattenMember, FlattenOptions, FnEndpoint, HandlerError, Middleware,
        OnCollision, ParamKind, Parameter, Request, Response, Schema, SchemaOptions, Signature,
        SubAppSpec, TypeHint, build_app, build_route, decorate, derive_schema, emit, flatten,
        introspect,
    };
    pub use serde::{Deserialize, Serialize};
}
