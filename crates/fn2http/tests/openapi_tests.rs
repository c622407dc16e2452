//! Tests for OpenAPI emission from assembled apps.

use fn2http::serde_json::json;
use fn2http::{
    AuthDeclaration, Config, FnEndpoint, Parameter, Signature, SubAppSpec, TypeHint, build_app,
    emit,
};

fn sig(params: Vec<Parameter>) -> Signature {
    Signature::new(params).unwrap()
}

fn add_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "add",
        sig(vec![
            Parameter::required("a").hint(TypeHint::Number),
            Parameter::with_default("b", 0),
        ])
        .returning(TypeHint::Number),
        |args| {
            Ok(json!(
                args.require("a")?.as_f64().unwrap_or(0.0)
                    + args.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0)
            ))
        },
    )
    .summary("Adds numbers")
}

fn search_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "search",
        sig(vec![
            Parameter::required("q").hint(TypeHint::String),
            Parameter::with_default("limit", 10),
        ]),
        |_| Ok(json!([])),
    )
    .http_method("get")
}

fn build() -> fn2http::App {
    let config = Config::new().set_global("title", "Calculator API");
    build_app(
        vec![
            SubAppSpec::new("calc")
                .endpoint(add_endpoint())
                .endpoint(search_endpoint()),
        ],
        &config,
    )
    .unwrap()
}

#[test]
fn test_document_structure() {
    let app = build();
    let doc = app.openapi_spec();

    assert_eq!(doc["openapi"], "3.0.2");
    assert_eq!(doc["info"]["title"], "Calculator API");
    assert_eq!(doc["servers"][0]["url"], "http://localhost:3030");
    assert!(doc["paths"]["/add"]["post"].is_object());
    assert!(doc["paths"]["/search"]["get"].is_object());
    assert!(doc["paths"]["/ping"]["get"].is_object());
}

#[test]
fn test_operation_entry_fields() {
    let app = build();
    let op = &app.openapi_spec()["paths"]["/add"]["post"];

    assert_eq!(op["operationId"], "add");
    assert_eq!(op["summary"], "Adds numbers");
    assert_eq!(op["x-method-name"], "add");
    assert!(op["responses"]["200"].is_object());
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["type"],
        "number"
    );
}

#[test]
fn test_request_body_required_set_round_trips_schema() {
    let app = build();
    let doc = app.openapi_spec();

    let body_schema =
        &doc["paths"]["/add"]["post"]["requestBody"]["content"]["application/json"]["schema"];
    let documented: Vec<&str> = body_schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    let route = app.routes().find(|r| r.name() == "add").unwrap();
    assert_eq!(documented, route.schema().required_names());

    assert_eq!(body_schema["properties"]["a"]["type"], "number");
    assert_eq!(body_schema["properties"]["b"]["default"], 0);
}

#[test]
fn test_query_routes_document_parameters_with_required_flags() {
    let app = build();
    let op = &app.openapi_spec()["paths"]["/search"]["get"];

    let params = op["parameters"].as_array().unwrap();
    let q = params.iter().find(|p| p["name"] == "q").unwrap();
    assert_eq!(q["in"], "query");
    assert_eq!(q["required"], true);

    let limit = params.iter().find(|p| p["name"] == "limit").unwrap();
    assert_eq!(limit["required"], false);

    // GET routes carry no request body
    assert!(op.get("requestBody").is_none());
}

#[test]
fn test_emission_is_byte_identical() {
    let first = fn2http::serde_json::to_vec(build().openapi_spec()).unwrap();
    let second = fn2http::serde_json::to_vec(build().openapi_spec()).unwrap();
    assert_eq!(first, second);

    let auth = AuthDeclaration::login("/login").with_refresh_url("/refresh");
    let with_auth_1 = fn2http::serde_json::to_vec(&emit(&build(), Some(&auth))).unwrap();
    let with_auth_2 = fn2http::serde_json::to_vec(&emit(&build(), Some(&auth))).unwrap();
    assert_eq!(with_auth_1, with_auth_2);
}

#[test]
fn test_api_key_auth_declaration() {
    let app = build().with_auth(AuthDeclaration::api_key());
    let doc = app.openapi_spec();

    let scheme = &doc["components"]["securitySchemes"]["apiKey"];
    assert_eq!(scheme["type"], "apiKey");
    assert_eq!(scheme["in"], "header");
    assert_eq!(doc["security"][0]["apiKey"], json!([]));
}

#[test]
fn test_login_auth_documents_declarative_endpoints() {
    let auth = AuthDeclaration::login("/login")
        .with_refresh_url("/refresh")
        .with_login_input_schema(json!({
            "type": "object",
            "properties": {"email": {"type": "string"}, "password": {"type": "string"}},
            "required": ["email", "password"]
        }));
    let app = build().with_auth(auth);
    let doc = app.openapi_spec();

    assert_eq!(
        doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
        "bearer"
    );
    let login = &doc["paths"]["/login"]["post"];
    assert_eq!(
        login["requestBody"]["content"]["application/json"]["schema"]["required"],
        json!(["email", "password"])
    );
    assert!(doc["paths"]["/refresh"]["post"].is_object());

    // Declarative only: no real route is mounted
    let resp = app.handle(&fn2http::Request::post("/login"));
    assert_eq!(resp.status, fn2http::http::StatusCode::NOT_FOUND);
}

#[test]
fn test_header_inputs_documented_as_header_parameters() {
    let config = Config::new().header_input("add", "X-Account", "account");
    let endpoint = FnEndpoint::new(
        "add",
        sig(vec![Parameter::required("a"), Parameter::required("account")]),
        |args| Ok(args.require("a")?.clone()),
    );
    let app = build_app(vec![SubAppSpec::new("svc").endpoint(endpoint)], &config).unwrap();
    let op = &app.openapi_spec()["paths"]["/add"]["post"];

    let params = op["parameters"].as_array().unwrap();
    let header = params.iter().find(|p| p["in"] == "header").unwrap();
    assert_eq!(header["name"], "X-Account");

    // Header-bound parameter is excluded from the body schema
    let properties =
        &op["requestBody"]["content"]["application/json"]["schema"]["properties"];
    assert!(properties.get("account").is_none());
    assert!(properties.get("a").is_some());
}
