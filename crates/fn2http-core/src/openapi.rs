//! Walks an assembled app and emits its OpenAPI document.

use serde_json::{Map, Value};

use fn2http_openapi::{
    AuthDeclaration, OpenApiBuilder, OpenApiOperation, OpenApiParameter, OpenApiPath, set_auth,
};

use crate::app::App;
use crate::route::RouteSpec;

fn request_body_for(route: &RouteSpec) -> Value {
    let mut properties = Map::new();
    for field in route.schema().fields() {
        let mut schema = field.json_schema();
        if let (Some(default), Some(obj)) = (&field.default, schema.as_object_mut()) {
            obj.insert("default".to_string(), default.clone());
        }
        properties.insert(field.name.clone(), schema);
    }

    let mut body_schema = Map::new();
    body_schema.insert("type".to_string(), Value::String("object".to_string()));
    body_schema.insert("properties".to_string(), Value::Object(properties));
    let required: Vec<Value> = route
        .schema()
        .required_names()
        .into_iter()
        .map(|n| Value::String(n.to_string()))
        .collect();
    if !required.is_empty() {
        body_schema.insert("required".to_string(), Value::Array(required));
    }

    serde_json::json!({
        "required": true,
        "content": {"application/json": {"schema": Value::Object(body_schema)}}
    })
}

fn operation_for(route: &RouteSpec) -> OpenApiOperation {
    let mut op = OpenApiOperation::default()
        .with_id(route.name())
        .with_extra("x-method-name", Value::String(route.name().to_string()));
    op.summary = route.summary().map(str::to_string);

    if route.accepts_body() {
        op = op.with_request_body(request_body_for(route));
    } else {
        for field in route.schema().fields() {
            op = op.with_parameter(
                OpenApiParameter::query(&field.name, field.required)
                    .with_schema(field.json_schema()),
            );
        }
    }

    // Header-bound parameters are documented regardless of body shape
    for binding in route.header_inputs() {
        op = op.with_parameter(OpenApiParameter::header(&binding.header, false));
    }

    let response_schema = route
        .returns()
        .map(|hint| hint.json_schema())
        .unwrap_or_else(|| serde_json::json!({}));
    op.with_response(
        "200",
        serde_json::json!({
            "description": route.summary().unwrap_or(""),
            "content": {"application/json": {"schema": response_schema}}
        }),
    )
}

/// Emit the OpenAPI document for an app.
///
/// Pure and order-stable: the same app and auth declaration produce a
/// byte-identical document. Operations are keyed by path then method.
pub fn emit(app: &App, auth: Option<&AuthDeclaration>) -> Value {
    let mut paths: Vec<OpenApiPath> = app
        .routes()
        .map(|route| {
            OpenApiPath::new(route.path(), route.method().as_str())
                .with_operation(operation_for(route))
        })
        .collect();
    paths.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));

    let mut doc = OpenApiBuilder::new()
        .title(app.title())
        .version(app.version())
        .server(app.base_url())
        .merge_paths(paths)
        .build();

    if let Some(auth) = auth {
        set_auth(&mut doc, auth);
    }
    doc
}
