//! Tests for route building and request dispatch.

use std::sync::Arc;

use fn2http::http::{Method, StatusCode};
use fn2http::serde_json::{Value, json};
use fn2http::{
    CallOutput, Config, FnEndpoint, HandlerError, JsonEncoder, OpaqueValue, Parameter, Request,
    Signature, TypeHint, build_route,
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
        ]),
        |args| {
            let a = args.require("a")?.as_f64().unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!(a + b))
        },
    )
}

fn div_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "div",
        sig(vec![
            Parameter::required("a").hint(TypeHint::Number),
            Parameter::required("b").hint(TypeHint::Number),
        ]),
        |args| {
            let a = args.require("a")?.as_f64().unwrap_or(0.0);
            let b = args.require("b")?.as_f64().unwrap_or(0.0);
            if b == 0.0 {
                return Err(HandlerError::invalid_input("division by zero")
                    .with_type_name("DivisionByZero"));
            }
            Ok(json!(a / b))
        },
    )
}

#[test]
fn test_add_scenario_defaults_applied() {
    // {"a": 3} -> add(3) with b defaulting to 0 -> {"result": 3}
    let route = build_route(Arc::new(add_endpoint()), &Config::new()).unwrap();
    let resp = route.dispatch(&Request::post("/add").json_body(&json!({"a": 3})));

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body_json(), Some(json!({"result": 3.0})));
}

#[test]
fn test_div_by_zero_goes_through_error_handler() {
    let route = build_route(Arc::new(div_endpoint()), &Config::new()).unwrap();
    let resp = route.dispatch(&Request::post("/div").json_body(&json!({"a": 1, "b": 0})));

    assert_ne!(resp.status, StatusCode::OK);
    let body = resp.body_json().unwrap();
    // Client-visible message, but no error type without the debug flag
    assert!(body["error"].as_str().unwrap().contains("division by zero"));
    assert!(body.get("error_type").is_none());
}

#[test]
fn test_div_by_zero_exposes_type_in_debug_mode() {
    let config = Config::new().set_global("debug_errors", true);
    let route = build_route(Arc::new(div_endpoint()), &config).unwrap();
    let resp = route.dispatch(&Request::post("/div").json_body(&json!({"a": 1, "b": 0})));

    let body = resp.body_json().unwrap();
    assert_eq!(body["error_type"], "DivisionByZero");
}

#[test]
fn test_internal_errors_are_opaque_unless_debug() {
    let endpoint = FnEndpoint::new("boom", Signature::empty(), |_| {
        Err(HandlerError::internal("sensitive detail").with_type_name("DbError"))
    });

    let route = build_route(Arc::new(endpoint.clone()), &Config::new()).unwrap();
    let resp = route.dispatch(&Request::post("/boom"));
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body_json().unwrap()["error"], "Internal server error");

    let debug_config = Config::new().set_global("debug_errors", true);
    let route = build_route(Arc::new(endpoint), &debug_config).unwrap();
    let resp = route.dispatch(&Request::post("/boom"));
    let body = resp.body_json().unwrap();
    assert!(body["error"].as_str().unwrap().contains("sensitive detail"));
    assert_eq!(body["error_type"], "DbError");
}

#[test]
fn test_validation_failure_is_a_client_error() {
    let route = build_route(Arc::new(add_endpoint()), &Config::new()).unwrap();

    let missing = route.dispatch(&Request::post("/add").json_body(&json!({})));
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let wrong_type = route.dispatch(&Request::post("/add").json_body(&json!({"a": "three"})));
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);

    let bad_body = route.dispatch(&Request::post("/add").body(b"not json".to_vec()));
    assert_eq!(bad_body.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_method_and_route_resolved_from_config_chain() {
    let config = Config::new()
        .set_for("add", "http_method", "get")
        .set_for("add", "route", "/sum");
    let route = build_route(Arc::new(add_endpoint()), &config).unwrap();

    assert_eq!(route.method(), &Method::GET);
    assert_eq!(route.path(), "/sum");

    // Callable attrs outrank the config maps
    let attributed = add_endpoint().route("/arithmetic/add");
    let route = build_route(Arc::new(attributed), &config).unwrap();
    assert_eq!(route.path(), "/arithmetic/add");
}

#[test]
fn test_get_routes_bind_query_parameters() {
    let config = Config::new().set_for("add", "http_method", "get");
    let route = build_route(Arc::new(add_endpoint()), &config).unwrap();
    let resp = route.dispatch(&Request::get("/add").query("a", "10").query("b", "32"));
    assert_eq!(resp.body_json(), Some(json!({"result": 42.0})));
}

#[test]
fn test_header_bound_params_beat_body_fields() {
    let endpoint = FnEndpoint::new(
        "audit",
        sig(vec![Parameter::required("actor"), Parameter::required("action")]),
        |args| {
            Ok(json!({
                "actor": args.require("actor")?,
                "action": args.require("action")?,
            }))
        },
    );
    let config = Config::new().header_input("audit", "X-Actor", "actor");
    let route = build_route(Arc::new(endpoint), &config).unwrap();

    let resp = route.dispatch(
        &Request::post("/audit")
            .header("X-Actor", "alice")
            .json_body(&json!({"actor": "mallory", "action": "write"})),
    );
    let body = resp.body_json().unwrap();
    assert_eq!(body["result"]["actor"], "alice");
    assert_eq!(body["result"]["action"], "write");
}

#[test]
fn test_result_field_shape_is_configurable() {
    let config = Config::new().set_global("result_field", Value::Null);
    let route = build_route(Arc::new(add_endpoint()), &config).unwrap();
    let resp = route.dispatch(&Request::post("/add").json_body(&json!({"a": 1, "b": 2})));
    // Bare value, no wrapper object
    assert_eq!(resp.body_json(), Some(json!(3.0)));
}

#[test]
fn test_encoder_hook_resolves_opaque_outputs() {
    struct Celsius(f64);
    struct CelsiusEncoder;
    impl JsonEncoder for CelsiusEncoder {
        fn encode(&self, value: &OpaqueValue) -> Option<Value> {
            value.downcast_ref::<Celsius>().map(|c| json!(c.0))
        }
    }

    let endpoint = FnEndpoint::raw("temperature", Signature::empty(), |_| {
        Ok(CallOutput::Opaque(OpaqueValue::new("Celsius", Celsius(21.5))))
    });

    // Without the hook: serialization error -> 500
    let route = build_route(Arc::new(endpoint.clone()), &Config::new()).unwrap();
    let resp = route.dispatch(&Request::post("/temperature"));
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);

    // With the hook: encoded
    let config = Config::new().encoder(Arc::new(CelsiusEncoder));
    let route = build_route(Arc::new(endpoint), &config).unwrap();
    let resp = route.dispatch(&Request::post("/temperature"));
    assert_eq!(resp.body_json(), Some(json!({"result": 21.5})));
}
