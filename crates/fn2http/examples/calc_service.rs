//! Example calculator service assembled from plain closures.
//!
//! Run with: cargo run --example calc_service
//! Then try:
//!   curl -X POST localhost:3030/add -d '{"a": 3, "b": 4}'
//!   curl localhost:3030/openapi

use std::sync::Arc;

use fn2http::prelude::*;
use fn2http::serde_json::{Value, json};

fn add_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "add",
        Signature::new(vec![
            Parameter::required("a").hint(TypeHint::Number),
            Parameter::with_default("b", 0.0),
        ])
        .expect("valid signature"),
        |args| {
            let a = args.require("a")?.as_f64().unwrap_or(0.0);
            let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!(a + b))
        },
    )
    .summary("Adds two numbers")
}

fn div_endpoint() -> FnEndpoint {
    FnEndpoint::new(
        "div",
        Signature::new(vec![
            Parameter::required("a").hint(TypeHint::Number),
            Parameter::required("b").hint(TypeHint::Number),
        ])
        .expect("valid signature"),
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
    .summary("Divides a by b")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new()
        .set_global("title", "Calculator API")
        .set_global("publish_openapi", true);

    let app = build_app(
        vec![
            SubAppSpec::new("calc")
                .endpoint(add_endpoint())
                .endpoint(div_endpoint()),
        ],
        &config,
    )?
    .with_auth(AuthDeclaration::api_key());

    let app = Arc::new(app);
    println!("listening on http://localhost:3030 (spec at /openapi)");
    let router = fn2http::serve::into_router(app);
    fn2http::serve::serve(router, "127.0.0.1:3030").await?;
    Ok(())
}
