//! Route assembly and per-request dispatch.
//!
//! [`build_route`] freezes a callable plus its resolved configuration into an
//! immutable [`RouteSpec`]. Dispatch runs the request through input mapping,
//! invocation, and output mapping; any failure along the way is routed
//! through the error handler and always comes back as a [`Response`].

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::Value;

use crate::config::{Config, HeaderBinding};
use crate::error::{BuildError, RequestError, SerializationError, ValidationError};
use crate::request::{Request, Response};
use crate::schema::{Schema, SchemaOptions, derive_schema};
use crate::signature::{
    ArgMap, CallArgs, CallOutput, Callable, OpaqueValue, Signature, TypeHint, extract_arguments,
    introspect,
};

/// Context handed to input mappers.
pub struct RouteContext<'a> {
    pub signature: &'a Signature,
    pub schema: &'a Schema,
    pub header_inputs: &'a [HeaderBinding],
}

/// Context handed to output mappers.
pub struct OutputContext {
    /// Field name the result is wrapped under; `None` emits the bare value.
    pub result_field: Option<String>,
    /// Hook for values the default encoder cannot serialize.
    pub encoder: Option<Arc<dyn JsonEncoder>>,
}

/// Maps a request to call arguments.
pub trait InputMapper: Send + Sync {
    fn map(&self, req: &Request, ctx: &RouteContext<'_>) -> Result<CallArgs, RequestError>;
}

/// Maps a callable's output to a response.
pub trait OutputMapper: Send + Sync {
    fn map(
        &self,
        output: CallOutput,
        args: &CallArgs,
        ctx: &OutputContext,
    ) -> Result<Response, RequestError>;
}

/// Maps a request-time error to a response.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &RequestError, debug: bool) -> Response;
}

/// Encodes values the default JSON encoder cannot serialize.
pub trait JsonEncoder: Send + Sync {
    /// Return `None` when this encoder doesn't recognize the value either.
    fn encode(&self, value: &OpaqueValue) -> Option<Value>;
}

/// Coerce a query-string value according to the field's hint. Unparseable
/// values are passed through as strings and left for schema validation.
fn coerce_query_value(raw: &str, hint: Option<&TypeHint>) -> Value {
    match hint {
        Some(TypeHint::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(TypeHint::Number) => raw
            .parse::<f64>()
            .ok()
            .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(TypeHint::Bool) => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::String(other.to_string()),
        },
        Some(TypeHint::Array) | Some(TypeHint::Object) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}

/// Default input mapper.
///
/// Binds, in increasing precedence: query parameters (coerced per hint),
/// JSON body fields, then header-bound parameters. Validates the collected
/// arguments against the schema and fills defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInputMapper;

impl InputMapper for DefaultInputMapper {
    fn map(&self, req: &Request, ctx: &RouteContext<'_>) -> Result<CallArgs, RequestError> {
        let mut args = ArgMap::new();

        for (key, raw) in req.query_params() {
            let hint = ctx.schema.get(key).and_then(|f| f.hint.as_ref());
            args.insert(key.clone(), coerce_query_value(raw, hint));
        }

        if let Some(body) = req.parsed_json()? {
            match body {
                Value::Object(fields) => {
                    for (key, value) in fields {
                        args.insert(key, value);
                    }
                }
                Value::Null => {}
                _ => {
                    return Err(ValidationError::InvalidBody {
                        message: "expected a JSON object".to_string(),
                    }
                    .into());
                }
            }
        }

        // Header-bound parameters win any name collision
        for binding in ctx.header_inputs {
            if let Some(value) = req.header_str(&binding.header) {
                args.insert(binding.param.clone(), Value::String(value.to_string()));
            }
        }

        ctx.schema.validate(&args)?;
        ctx.schema.fill_defaults(&mut args);

        let extracted = extract_arguments(ctx.signature, &args);
        Ok(CallArgs {
            positional: extracted.positional,
            keyword: extracted.keyword,
        })
    }
}

/// Default output mapper: serializes the return value as JSON with status
/// 200, wrapping it under the configured result field. Opaque values go
/// through the encoder hook first and fail with a serialization error if the
/// hook cannot handle them either.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOutputMapper;

impl OutputMapper for DefaultOutputMapper {
    fn map(
        &self,
        output: CallOutput,
        _args: &CallArgs,
        ctx: &OutputContext,
    ) -> Result<Response, RequestError> {
        let value = match output {
            CallOutput::Json(value) => value,
            CallOutput::Opaque(opaque) => ctx
                .encoder
                .as_ref()
                .and_then(|encoder| encoder.encode(&opaque))
                .ok_or_else(|| SerializationError {
                    type_name: opaque.type_name().to_string(),
                })?,
        };

        let body = match &ctx.result_field {
            Some(field) => serde_json::json!({field.as_str(): value}),
            None => value,
        };
        Ok(Response::ok_json(&body))
    }
}

/// Default error handler: JSON `{"error": message}` with the error's mapped
/// status. Server-side failures get an opaque message, and the original
/// error type is exposed in `error_type` only when debug is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, error: &RequestError, debug: bool) -> Response {
        let status =
            StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() && !debug {
            "Internal server error".to_string()
        } else {
            error.to_string()
        };

        let mut body = ArgMap::new();
        body.insert("error".to_string(), Value::String(message));
        if debug {
            body.insert(
                "error_type".to_string(),
                Value::String(error.type_name().to_string()),
            );
        }
        Response::json(status, &Value::Object(body))
    }
}

/// A fully resolved route: path, method, callable, schema, and mappers.
/// Built once at app-assembly time; immutable thereafter.
pub struct RouteSpec {
    name: String,
    method: Method,
    path: String,
    summary: Option<String>,
    signature: Signature,
    schema: Schema,
    handler: Arc<dyn Callable>,
    input_mapper: Arc<dyn InputMapper>,
    output_mapper: Arc<dyn OutputMapper>,
    error_handler: Arc<dyn ErrorHandler>,
    header_inputs: Vec<HeaderBinding>,
    encoder: Option<Arc<dyn JsonEncoder>>,
    result_field: Option<String>,
    debug_errors: bool,
}

impl RouteSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The callable's return hint, for response documentation.
    pub fn returns(&self) -> Option<&TypeHint> {
        self.signature.returns()
    }

    pub fn header_inputs(&self) -> &[HeaderBinding] {
        &self.header_inputs
    }

    /// Whether this route's method carries a request body.
    pub fn accepts_body(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }

    pub(crate) fn with_path_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.path = format!("{}{}", prefix, self.path);
        }
        self
    }

    fn errored(&self, error: RequestError) -> Response {
        tracing::warn!(
            route = %self.path,
            error = %error,
            "request failed; converting to error response"
        );
        self.error_handler.handle(&error, self.debug_errors)
    }

    /// Run one request through the route:
    /// received → mapped → invoked → mapped-output → sent, with the
    /// errored → error-handled → sent side path on any failure.
    pub fn dispatch(&self, req: &Request) -> Response {
        tracing::debug!(method = %self.method, path = %self.path, "handling request");

        let ctx = RouteContext {
            signature: &self.signature,
            schema: &self.schema,
            header_inputs: &self.header_inputs,
        };
        let args = match self.input_mapper.map(req, &ctx) {
            Ok(args) => args,
            Err(error) => return self.errored(error),
        };

        let output = match self.handler.call(&args) {
            Ok(output) => output,
            Err(error) => return self.errored(error.into()),
        };

        let out_ctx = OutputContext {
            result_field: self.result_field.clone(),
            encoder: self.encoder.clone(),
        };
        match self.output_mapper.map(output, &args, &out_ctx) {
            Ok(response) => response,
            Err(error) => self.errored(error),
        }
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

const VALID_METHODS: [&str; 4] = ["get", "put", "post", "delete"];

/// Build a route from a callable and the resolved configuration chain.
pub fn build_route(handler: Arc<dyn Callable>, config: &Config) -> Result<RouteSpec, BuildError> {
    let name = handler.name().to_string();

    let method_setting = config.resolve_required(handler.as_ref(), "http_method")?;
    let method_str = method_setting
        .as_str()
        .map(str::to_lowercase)
        .filter(|m| VALID_METHODS.contains(&m.as_str()))
        .ok_or_else(|| BuildError::Configuration {
            key: "http_method".to_string(),
        })?;
    let method = method_str
        .to_uppercase()
        .parse::<Method>()
        .map_err(|_| BuildError::Configuration {
            key: "http_method".to_string(),
        })?;

    let path = config
        .resolve(handler.as_ref(), "route")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("/{name}"));

    let summary = config
        .resolve(handler.as_ref(), "summary")
        .and_then(|v| v.as_str().map(str::to_string));

    let header_inputs = config.resolved_header_inputs(&name);
    let signature = introspect(handler.as_ref())?;
    let schema_options = SchemaOptions::default()
        .exclude_all(header_inputs.iter().map(|b| b.param.clone()));
    let schema = derive_schema(&signature, &schema_options)?;

    let result_field = match config.resolve(handler.as_ref(), "result_field") {
        Some(Value::String(field)) => Some(field),
        _ => None,
    };
    let debug_errors = config
        .resolve(handler.as_ref(), "debug_errors")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    Ok(RouteSpec {
        input_mapper: config
            .resolved_input_mapper(&name)
            .unwrap_or_else(|| Arc::new(DefaultInputMapper)),
        output_mapper: config
            .resolved_output_mapper(&name)
            .unwrap_or_else(|| Arc::new(DefaultOutputMapper)),
        error_handler: config
            .resolved_error_handler(&name)
            .unwrap_or_else(|| Arc::new(DefaultErrorHandler)),
        encoder: config.resolved_encoder(),
        name,
        method,
        path,
        summary,
        signature,
        schema,
        handler,
        header_inputs,
        result_field,
        debug_errors,
    })
}
