//! Core callable-to-endpoint pipeline for fn2http.
//!
//! Turns explicitly-declared callables into a fully specified HTTP surface:
//! signature introspection, decorator composition, schema derivation, route
//! and app assembly, and OpenAPI emission. Everything here is a build-time,
//! synchronous operation; per-request dispatch is driven by the serving
//! layer through the exported route table.
//!
//! # Example
//!
//! ```ignore
//! use fn2http_core::{build_app, Config, FnEndpoint, Parameter, Signature, SubAppSpec};
//!
//! let add = FnEndpoint::new(
//!     "add",
//!     Signature::new(vec![
//!         Parameter::required("a"),
//!         Parameter::with_default("b", 0),
//!     ])?,
//!     |args| {
//!         let a = args.require("a")?.as_f64().unwrap_or(0.0);
//!         let b = args.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
//!         Ok(serde_json::json!(a + b))
//!     },
//! );
//!
//! let app = build_app(
//!     vec![SubAppSpec::new("calc").endpoint(add)],
//!     &Config::new(),
//! )?;
//! let spec = app.openapi_spec();
//! ```

pub mod app;
pub mod compose;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod request;
pub mod route;
pub mod schema;
pub mod signature;

// Re-export the http types the request surface is built on
pub use http;

pub use app::{App, RouteHandler, SubAppSpec, build_app};
pub use compose::{
    Decorator, DecoratorStack, FlatEndpoint, FlattenMember, FlattenOptions, OnCollision,
    add_parameter_set, coerce_output, decorate, flatten, literal_guard, replace_parameters,
};
pub use config::{Config, HeaderBinding};
pub use error::{
    BuildError, ErrorCode, HandlerError, RequestError, SerializationError, ValidationError,
};
pub use middleware::{ApiKeyAuth, Cors, Middleware, Next};
pub use openapi::emit;
pub use request::{JSON_CONTENT_TYPE, Request, Response};
pub use route::{
    DefaultErrorHandler, DefaultInputMapper, DefaultOutputMapper, ErrorHandler, InputMapper,
    JsonEncoder, OutputMapper, RouteSpec, build_route,
};
pub use schema::{FieldSchema, Schema, SchemaOptions, derive_schema};
pub use signature::{
    ArgMap, CallArgs, CallOutput, Callable, ExtractedArgs, FnEndpoint, OpaqueValue, ParamKind,
    Parameter, Signature, TypeHint, extract_arguments, introspect,
};

/// Result type for build-time operations.
pub type Result<T> = std::result::Result<T, BuildError>;
