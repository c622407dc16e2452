//! Tests for sub-app merging and app-level dispatch.

use std::sync::Arc;

use fn2http::http::{Method, StatusCode};
use fn2http::serde_json::json;
use fn2http::{
    ApiKeyAuth, BuildError, Config, Cors, FnEndpoint, Parameter, Request, Signature, SubAppSpec,
    build_app,
};

fn endpoint(name: &str) -> FnEndpoint {
    let reply = json!({"from": name});
    FnEndpoint::new(name, Signature::empty(), move |_| Ok(reply.clone()))
}

fn echo_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "echo",
        Signature::new(vec![Parameter::required("text")]).unwrap(),
        |args| Ok(args.require("text")?.clone()),
    )
}

#[test]
fn test_disjoint_subapps_merge_to_sum_of_routes() {
    let app = build_app(
        vec![
            SubAppSpec::new("alpha").endpoint(endpoint("foo")).endpoint(endpoint("bar")),
            SubAppSpec::new("beta").endpoint(endpoint("baz")),
        ],
        &Config::new(),
    )
    .unwrap();

    // 2 + 1 routes plus the auto-mounted /ping
    assert_eq!(app.route_count(), 4);
}

#[test]
fn test_overlapping_routes_fail_with_duplicate_route() {
    let result = build_app(
        vec![
            SubAppSpec::new("alpha").endpoint(endpoint("foo")),
            SubAppSpec::new("beta").endpoint(endpoint("foo")),
        ],
        &Config::new(),
    );
    assert!(matches!(
        result,
        Err(BuildError::DuplicateRoute { method, path }) if method == "POST" && path == "/foo"
    ));
}

#[test]
fn test_retired_route_may_be_replaced() {
    let replacement = FnEndpoint::new("foo", Signature::empty(), |_| Ok(json!("v2")));

    let app = build_app(
        vec![
            SubAppSpec::new("alpha").endpoint(endpoint("foo")),
            SubAppSpec::new("beta")
                .retire(Method::POST, "/foo")
                .endpoint(replacement),
        ],
        &Config::new(),
    )
    .unwrap();

    let resp = app.handle(&Request::post("/foo"));
    assert_eq!(resp.body_json(), Some(json!({"result": "v2"})));
}

#[test]
fn test_duplicate_subapp_names_rejected() {
    let result = build_app(
        vec![
            SubAppSpec::new("alpha").endpoint(endpoint("foo")),
            SubAppSpec::new("alpha").endpoint(endpoint("bar")),
        ],
        &Config::new(),
    );
    assert!(matches!(result, Err(BuildError::Configuration { .. })));
}

#[test]
fn test_subapp_prefix_mounts_routes() {
    let app = build_app(
        vec![SubAppSpec::new("calc").prefix("/calc").endpoint(endpoint("foo"))],
        &Config::new(),
    )
    .unwrap();

    assert_eq!(app.handle(&Request::post("/calc/foo")).status, StatusCode::OK);
    assert_eq!(app.handle(&Request::post("/foo")).status, StatusCode::NOT_FOUND);
}

#[test]
fn test_ping_route_is_mounted() {
    let app = build_app(vec![SubAppSpec::new("svc")], &Config::new()).unwrap();
    let resp = app.handle(&Request::get("/ping"));
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body_json(), Some(json!({"ping": "pong"})));
}

#[test]
fn test_unknown_route_is_a_json_404() {
    let app = build_app(vec![SubAppSpec::new("svc")], &Config::new()).unwrap();
    let resp = app.handle(&Request::post("/nowhere"));
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body_json().unwrap()["error"].is_string());
}

#[test]
fn test_api_key_middleware_guards_subapp() {
    let app = build_app(
        vec![
            SubAppSpec::new("secure")
                .middleware(Arc::new(ApiKeyAuth::new("s3cret")))
                .endpoint(echo_endpoint()),
        ],
        &Config::new(),
    )
    .unwrap();

    let denied = app.handle(&Request::post("/echo").json_body(&json!({"text": "hi"})));
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let allowed = app.handle(
        &Request::post("/echo")
            .header("Authorization", "s3cret")
            .json_body(&json!({"text": "hi"})),
    );
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body_json(), Some(json!({"result": "hi"})));

    // Middleware scope is per sub-app: /ping stays open
    assert_eq!(app.handle(&Request::get("/ping")).status, StatusCode::OK);
}

#[test]
fn test_cors_middleware_adds_headers() {
    let app = build_app(
        vec![
            SubAppSpec::new("open")
                .middleware(Arc::new(Cors::any()))
                .endpoint(endpoint("foo")),
        ],
        &Config::new(),
    )
    .unwrap();

    let resp = app.handle(&Request::post("/foo"));
    assert_eq!(
        resp.headers.get("Access-Control-Allow-Origin").unwrap(),
        "*"
    );
}

#[test]
fn test_route_table_exports_working_handlers() {
    let app = Arc::new(
        build_app(
            vec![SubAppSpec::new("svc").endpoint(echo_endpoint())],
            &Config::new(),
        )
        .unwrap(),
    );

    let table = app.route_table();
    let (_, _, handler) = table
        .iter()
        .find(|(method, path, _)| *method == Method::POST && path.as_str() == "/echo")
        .unwrap();

    let resp = handler(&Request::post("/echo").json_body(&json!({"text": "via table"})));
    assert_eq!(resp.body_json(), Some(json!({"result": "via table"})));
}

#[test]
fn test_openapi_route_served_when_published() {
    let config = Config::new().set_global("publish_openapi", true);
    let app = build_app(vec![SubAppSpec::new("svc").endpoint(endpoint("foo"))], &config).unwrap();

    let resp = app.handle(&Request::get("/openapi"));
    assert_eq!(resp.status, StatusCode::OK);
    let doc = resp.body_json().unwrap();
    assert_eq!(doc["openapi"], "3.0.2");
    assert!(doc["paths"]["/foo"]["post"].is_object());

    // Not published by default
    let app = build_app(
        vec![SubAppSpec::new("svc").endpoint(endpoint("foo"))],
        &Config::new(),
    )
    .unwrap();
    assert_eq!(app.handle(&Request::get("/openapi")).status, StatusCode::NOT_FOUND);
}

#[test]
fn test_openapi_spec_is_computed_once_and_cached() {
    let app = build_app(vec![SubAppSpec::new("svc").endpoint(endpoint("foo"))], &Config::new())
        .unwrap();

    let first = app.openapi_spec() as *const _;
    let second = app.openapi_spec() as *const _;
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_first_access_to_openapi_spec() {
    let app = Arc::new(
        build_app(
            vec![SubAppSpec::new("svc").endpoint(endpoint("foo"))],
            &Config::new(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || app.openapi_spec().clone())
        })
        .collect();

    let mut specs = handles.into_iter().map(|h| h.join().unwrap());
    let first = specs.next().unwrap();
    assert!(specs.all(|s| s == first));
}
