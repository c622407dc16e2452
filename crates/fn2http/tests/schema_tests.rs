//! Tests for schema derivation from signatures.

use fn2http::serde_json::json;
use fn2http::{
    BuildError, Parameter, Schema, SchemaOptions, Signature, TypeHint, derive_schema,
};

fn sig(params: Vec<Parameter>) -> Signature {
    Signature::new(params).unwrap()
}

#[test]
fn test_derive_schema_is_deterministic() {
    let s = sig(vec![
        Parameter::required("a").hint(TypeHint::Number),
        Parameter::with_default("b", 0.0),
        Parameter::with_default("mode", "fast")
            .hint(TypeHint::Literal(vec![json!("fast"), json!("slow")])),
    ]);
    let opts = SchemaOptions::default();

    let first = derive_schema(&s, &opts).unwrap();
    let second = derive_schema(&s, &opts).unwrap();
    assert_eq!(first, second);

    // Serialized forms match too
    assert_eq!(
        fn2http::serde_json::to_string(&first).unwrap(),
        fn2http::serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_add_scenario_schema() {
    // add(a, b=0) -> {a: required}, {b: default 0}
    let s = sig(vec![
        Parameter::required("a"),
        Parameter::with_default("b", 0),
    ]);
    let schema = derive_schema(&s, &SchemaOptions::default()).unwrap();

    assert_eq!(schema.required_names(), vec!["a"]);
    let b = schema.get("b").unwrap();
    assert!(!b.required);
    assert_eq!(b.default, Some(json!(0)));
    assert_eq!(b.hint, Some(TypeHint::Integer));
}

#[test]
fn test_schema_keys_are_positionally_consistent_with_signature() {
    let s = sig(vec![
        Parameter::required("one"),
        Parameter::required("two"),
        Parameter::with_default("three", 3),
        Parameter::with_default("four", 4),
    ]);
    let schema = derive_schema(&s, &SchemaOptions::default()).unwrap();

    let schema_names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    let sig_names: Vec<&str> = s.names().collect();
    assert_eq!(schema_names, sig_names);
}

#[test]
fn test_exclude_keys_and_source_param() {
    let s = sig(vec![
        Parameter::required("account"),
        Parameter::required("payload").hint(TypeHint::Object),
    ]);

    let schema = derive_schema(&s, &SchemaOptions::default().exclude("account")).unwrap();
    assert!(schema.get("account").is_none());
    assert_eq!(
        schema.get("payload").unwrap().source.as_ref().map(|p| p.name.as_str()),
        Some("payload")
    );

    let bare = derive_schema(
        &s,
        &SchemaOptions::default().include_source_param(false),
    )
    .unwrap();
    assert!(bare.get("payload").unwrap().source.is_none());
}

#[test]
fn test_unannotated_defaultless_param_is_unconstrained() {
    let s = sig(vec![Parameter::required("anything")]);
    let schema = derive_schema(&s, &SchemaOptions::default()).unwrap();
    let field = schema.get("anything").unwrap();
    assert!(field.hint.is_none());
    assert_eq!(field.json_schema(), json!({}));

    // Unconstrained admits any shape
    assert!(schema.validate(json!({"anything": [1, 2]}).as_object().unwrap()).is_ok());
    assert!(schema.validate(json!({"anything": "text"}).as_object().unwrap()).is_ok());
}

#[test]
fn test_bare_variadics_rejected_without_catch_all_mapping() {
    let var_pos = sig(vec![Parameter::var_positional("items")]);
    let var_kw = sig(vec![Parameter::var_keyword("rest")]);

    for s in [&var_pos, &var_kw] {
        assert!(matches!(
            derive_schema(s, &SchemaOptions::default()),
            Err(BuildError::UnsupportedParameterKind { .. })
        ));
    }

    let opts = SchemaOptions::default().catch_all_variadics(true);
    let pos_schema: Schema = derive_schema(&var_pos, &opts).unwrap();
    assert_eq!(pos_schema.get("items").unwrap().hint, Some(TypeHint::Array));
    let kw_schema = derive_schema(&var_kw, &opts).unwrap();
    assert_eq!(kw_schema.get("rest").unwrap().hint, Some(TypeHint::Object));
}

#[test]
fn test_literal_constraint_validates_membership() {
    let s = sig(vec![
        Parameter::required("level").hint(TypeHint::Literal(vec![
            json!("debug"),
            json!("info"),
            json!("error"),
        ])),
    ]);
    let schema = derive_schema(&s, &SchemaOptions::default()).unwrap();

    assert!(schema.validate(json!({"level": "info"}).as_object().unwrap()).is_ok());
    assert!(schema.validate(json!({"level": "trace"}).as_object().unwrap()).is_err());
}
