//! Canonical representation of a callable's parameters.
//!
//! A [`Signature`] is an ordered list of [`Parameter`]s plus an optional
//! return hint. Callables declare their signature explicitly; everything
//! downstream (composition, schema derivation, route assembly, OpenAPI
//! emission) works from this declaration rather than probing the callable.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BuildError, HandlerError};

/// A JSON object mapping names to values. Used for keyword arguments,
/// callable attributes, and config settings.
pub type ArgMap = Map<String, Value>;

/// The calling-convention role of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    /// Whether this kind absorbs an arbitrary number of arguments.
    pub fn is_variadic(&self) -> bool {
        matches!(self, ParamKind::VarPositional | ParamKind::VarKeyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::PositionalOnly => "positional-only",
            ParamKind::PositionalOrKeyword => "positional-or-keyword",
            ParamKind::VarPositional => "variadic-positional",
            ParamKind::KeywordOnly => "keyword-only",
            ParamKind::VarKeyword => "variadic-keyword",
        }
    }
}

/// A JSON-shaped type annotation.
///
/// `Literal` constrains a parameter to an enumerated set of constant values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeHint {
    Bool,
    Integer,
    Number,
    String,
    Array,
    Object,
    Literal(Vec<Value>),
}

impl TypeHint {
    /// Infer a hint from a concrete JSON value (e.g. a parameter default).
    pub fn from_value(value: &Value) -> Option<TypeHint> {
        match value {
            Value::Bool(_) => Some(TypeHint::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(TypeHint::Integer),
            Value::Number(_) => Some(TypeHint::Number),
            Value::String(_) => Some(TypeHint::String),
            Value::Array(_) => Some(TypeHint::Array),
            Value::Object(_) => Some(TypeHint::Object),
            Value::Null => None,
        }
    }

    /// The OpenAPI schema fragment for this hint.
    pub fn json_schema(&self) -> Value {
        match self {
            TypeHint::Bool => serde_json::json!({"type": "boolean"}),
            TypeHint::Integer => serde_json::json!({"type": "integer"}),
            TypeHint::Number => serde_json::json!({"type": "number"}),
            TypeHint::String => serde_json::json!({"type": "string"}),
            TypeHint::Array => serde_json::json!({"type": "array"}),
            TypeHint::Object => serde_json::json!({"type": "object"}),
            TypeHint::Literal(values) => serde_json::json!({"enum": values}),
        }
    }

    /// Whether a concrete value satisfies this hint.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            TypeHint::Bool => value.is_boolean(),
            TypeHint::Integer => value.is_i64() || value.is_u64(),
            TypeHint::Number => value.is_number(),
            TypeHint::String => value.is_string(),
            TypeHint::Array => value.is_array(),
            TypeHint::Object => value.is_object(),
            TypeHint::Literal(values) => values.contains(value),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeHint::Bool => "boolean".to_string(),
            TypeHint::Integer => "integer".to_string(),
            TypeHint::Number => "number".to_string(),
            TypeHint::String => "string".to_string(),
            TypeHint::Array => "array".to_string(),
            TypeHint::Object => "object".to_string(),
            TypeHint::Literal(values) => format!("one of {} values", values.len()),
        }
    }
}

/// A single parameter of a callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    /// Default value; `None` means the parameter is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<TypeHint>,
    /// Reserved parameters refuse to be overwritten during composition.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reserved: bool,
}

impl Parameter {
    /// A required positional-or-keyword parameter.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            default: None,
            hint: None,
            reserved: false,
        }
    }

    /// A positional-or-keyword parameter with a default. The hint is
    /// inferred from the default's JSON type.
    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        let hint = TypeHint::from_value(&default);
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            default: Some(default),
            hint,
            reserved: false,
        }
    }

    /// A required keyword-only parameter.
    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::KeywordOnly,
            ..Self::required(name)
        }
    }

    /// The catch-all positional parameter (at most one per signature).
    pub fn var_positional(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::VarPositional,
            ..Self::required(name)
        }
    }

    /// The catch-all keyword parameter (at most one per signature).
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::VarKeyword,
            ..Self::required(name)
        }
    }

    pub fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Mark this parameter as reserved: composition may not replace it.
    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    /// Whether the parameter is required (has no default).
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Ordered parameter sequence plus an optional return hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    params: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    returns: Option<TypeHint>,
}

impl Signature {
    /// Build a signature, validating parameter invariants:
    /// unique names, non-decreasing kind order, at most one variadic of each
    /// flavor, and no default-less positional parameter after a defaulted one.
    pub fn new(params: Vec<Parameter>) -> Result<Self, BuildError> {
        let mut seen = std::collections::HashSet::new();
        let mut var_positional = 0usize;
        let mut var_keyword = 0usize;
        let mut last_kind: Option<ParamKind> = None;
        let mut positional_default_seen = false;

        for param in &params {
            if !seen.insert(param.name.clone()) {
                return Err(BuildError::Signature {
                    message: format!("duplicate parameter name '{}'", param.name),
                });
            }
            if let Some(prev) = last_kind
                && param.kind < prev
            {
                return Err(BuildError::Signature {
                    message: format!(
                        "{} parameter '{}' follows a {} parameter",
                        param.kind.as_str(),
                        param.name,
                        prev.as_str()
                    ),
                });
            }
            last_kind = Some(param.kind);
            match param.kind {
                ParamKind::VarPositional => var_positional += 1,
                ParamKind::VarKeyword => var_keyword += 1,
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword => {
                    if param.default.is_some() {
                        positional_default_seen = true;
                    } else if positional_default_seen {
                        return Err(BuildError::Signature {
                            message: format!(
                                "required parameter '{}' follows a parameter with a default",
                                param.name
                            ),
                        });
                    }
                }
                ParamKind::KeywordOnly => {}
            }
        }
        if var_positional > 1 || var_keyword > 1 {
            return Err(BuildError::Signature {
                message: "at most one variadic parameter of each kind is allowed".to_string(),
            });
        }

        Ok(Self {
            params,
            returns: None,
        })
    }

    /// The empty signature.
    pub fn empty() -> Self {
        Self {
            params: Vec::new(),
            returns: None,
        }
    }

    /// Set the return hint.
    pub fn returning(mut self, hint: TypeHint) -> Self {
        self.returns = Some(hint);
        self
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn returns(&self) -> Option<&TypeHint> {
        self.returns.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether the signature carries a variadic-keyword parameter.
    pub fn has_var_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }

    /// Rebuild with the same return hint from a new parameter list.
    pub(crate) fn with_params(&self, params: Vec<Parameter>) -> Result<Self, BuildError> {
        let mut sig = Signature::new(params)?;
        sig.returns = self.returns.clone();
        Ok(sig)
    }
}

/// Arguments for one invocation of a callable.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Values bound to positional-only parameters, in declaration order.
    pub positional: Vec<Value>,
    /// Values bound by name.
    pub keyword: ArgMap,
}

impl CallArgs {
    pub fn from_keywords(keyword: ArgMap) -> Self {
        Self {
            positional: Vec::new(),
            keyword,
        }
    }

    /// Look up a keyword argument.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// Look up a keyword argument, failing with an invalid-input error.
    pub fn require(&self, name: &str) -> Result<&Value, HandlerError> {
        self.get(name)
            .ok_or_else(|| HandlerError::invalid_input(format!("missing argument '{name}'")))
    }
}

/// A value the default JSON encoder cannot serialize directly.
///
/// Carried through the output mapper to the configured encoder hook.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl std::fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpaqueValue({})", self.type_name)
    }
}

/// What a callable returns: JSON, or an opaque value for the encoder hook.
#[derive(Debug, Clone)]
pub enum CallOutput {
    Json(Value),
    Opaque(OpaqueValue),
}

impl From<Value> for CallOutput {
    fn from(value: Value) -> Self {
        CallOutput::Json(value)
    }
}

fn empty_attrs() -> &'static ArgMap {
    static EMPTY: OnceLock<ArgMap> = OnceLock::new();
    EMPTY.get_or_init(ArgMap::new)
}

/// An invocable unit with declared parameter metadata.
///
/// The serving pipeline only ever talks to callables through this trait:
/// `signature()` feeds composition and schema derivation, `attrs()` feeds
/// config resolution, and `call()` performs the work. Implementations must be
/// safe to invoke concurrently for distinct requests.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;

    /// Declared signature, or `None` for callables without readable
    /// parameter metadata.
    fn signature(&self) -> Option<&Signature>;

    /// Per-callable metadata (http_method, route, summary, ...). Consulted
    /// first during config resolution.
    fn attrs(&self) -> &ArgMap {
        empty_attrs()
    }

    fn call(&self, args: &CallArgs) -> Result<CallOutput, HandlerError>;
}

type EndpointFn = dyn Fn(&CallArgs) -> Result<CallOutput, HandlerError> + Send + Sync;

/// A closure with an explicitly declared [`Signature`].
///
/// This is the bridge between ordinary Rust functions and the pipeline:
///
/// ```ignore
/// let add = FnEndpoint::new(
///     "add",
///     Signature::new(vec![
///         Parameter::required("a").hint(TypeHint::Number),
///         Parameter::with_default("b", 0),
///     ])?,
///     |args| {
///         let a = args.require("a")?.as_f64().unwrap_or(0.0);
///         let b = args.get("b").and_then(Value::as_f64).unwrap_or(0.0);
///         Ok(serde_json::json!(a + b))
///     },
/// );
/// ```
#[derive(Clone)]
pub struct FnEndpoint {
    name: String,
    signature: Option<Signature>,
    attrs: ArgMap,
    func: Arc<EndpointFn>,
}

impl FnEndpoint {
    /// Wrap a JSON-returning closure with a declared signature.
    pub fn new<F>(name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Some(signature),
            attrs: ArgMap::new(),
            func: Arc::new(move |args| func(args).map(CallOutput::Json)),
        }
    }

    /// Wrap a closure that may return opaque output for the encoder hook.
    pub fn raw<F>(name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<CallOutput, HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Some(signature),
            attrs: ArgMap::new(),
            func: Arc::new(func),
        }
    }

    /// A callable with no readable signature metadata, standing in for
    /// foreign-built callables. Introspection of it fails.
    pub fn opaque<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: None,
            attrs: ArgMap::new(),
            func: Arc::new(move |args| func(args).map(CallOutput::Json)),
        }
    }

    /// Attach a metadata attribute, consulted first by config resolution.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Shorthand for the `http_method` attribute.
    pub fn http_method(self, method: &str) -> Self {
        self.with_attr("http_method", method)
    }

    /// Shorthand for the `route` attribute.
    pub fn route(self, path: &str) -> Self {
        self.with_attr("route", path)
    }

    /// Shorthand for the `summary` attribute (operation doc line).
    pub fn summary(self, text: &str) -> Self {
        self.with_attr("summary", text)
    }
}

impl Callable for FnEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn attrs(&self) -> &ArgMap {
        &self.attrs
    }

    fn call(&self, args: &CallArgs) -> Result<CallOutput, HandlerError> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for FnEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEndpoint")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Read a callable's signature.
///
/// Deterministic and side-effect-free; fails with
/// [`BuildError::Introspection`] when the callable declares no metadata.
pub fn introspect(callable: &dyn Callable) -> Result<Signature, BuildError> {
    callable.signature().cloned().ok_or_else(|| BuildError::Introspection {
        name: callable.name().to_string(),
    })
}

/// The result of splitting a keyword map against a signature.
#[derive(Debug, Clone, Default)]
pub struct ExtractedArgs {
    /// Values for positional-only parameters, in declaration order. Missing
    /// positions hold `Value::Null` and are listed in `missing_positional`.
    pub positional: Vec<Value>,
    /// Names matching non-positional-only parameters, in declaration order.
    pub keyword: ArgMap,
    /// Input keys that match no parameter.
    pub remaining: ArgMap,
    /// Positional-only parameter names absent from the input.
    pub missing_positional: Vec<String>,
}

/// Split a keyword map into the arguments a signature accepts.
///
/// Positional-only parameters are pulled out first (in signature order, not
/// input order); everything else that names a parameter becomes a keyword
/// argument; the rest lands in `remaining`, unless the signature carries a
/// variadic-keyword parameter, in which case the remainder is folded into the
/// keyword map.
pub fn extract_arguments(signature: &Signature, kwargs: &ArgMap) -> ExtractedArgs {
    let mut out = ExtractedArgs::default();
    if signature.is_empty() {
        out.remaining = kwargs.clone();
        return out;
    }

    let positional_names: Vec<&str> = signature
        .params()
        .iter()
        .filter(|p| p.kind == ParamKind::PositionalOnly)
        .map(|p| p.name.as_str())
        .collect();

    for name in &positional_names {
        match kwargs.get(*name) {
            Some(value) => out.positional.push(value.clone()),
            None => {
                out.positional.push(Value::Null);
                out.missing_positional.push((*name).to_string());
            }
        }
    }

    for param in signature.params() {
        if param.kind == ParamKind::PositionalOnly || param.kind.is_variadic() {
            continue;
        }
        if let Some(value) = kwargs.get(&param.name) {
            out.keyword.insert(param.name.clone(), value.clone());
        }
    }

    for (key, value) in kwargs {
        if !signature.contains(key) {
            out.remaining.insert(key.clone(), value.clone());
        }
    }

    if signature.has_var_keyword() && !out.remaining.is_empty() {
        out.keyword.append(&mut out.remaining);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sig(params: Vec<Parameter>) -> Signature {
        Signature::new(params).unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Signature::new(vec![Parameter::required("a"), Parameter::required("a")]);
        assert!(matches!(err, Err(BuildError::Signature { .. })));
    }

    #[test]
    fn test_kind_order_enforced() {
        let err = Signature::new(vec![
            Parameter::keyword_only("k"),
            Parameter::required("a"),
        ]);
        assert!(matches!(err, Err(BuildError::Signature { .. })));
    }

    #[test]
    fn test_default_ordering_enforced() {
        let err = Signature::new(vec![
            Parameter::with_default("a", 1),
            Parameter::required("b"),
        ]);
        assert!(matches!(err, Err(BuildError::Signature { .. })));

        // Keyword-only parameters are exempt from the ordering rule
        let ok = Signature::new(vec![
            Parameter::with_default("a", 1),
            Parameter::keyword_only("k"),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_single_variadic_of_each_kind() {
        let err = Signature::new(vec![
            Parameter::var_positional("args"),
            Parameter::var_positional("more"),
        ]);
        assert!(matches!(err, Err(BuildError::Signature { .. })));
    }

    #[test]
    fn test_default_infers_hint() {
        let p = Parameter::with_default("b", 0.5);
        assert_eq!(p.hint, Some(TypeHint::Number));
        let p = Parameter::with_default("n", 3);
        assert_eq!(p.hint, Some(TypeHint::Integer));
        let p = Parameter::with_default("s", "hi");
        assert_eq!(p.hint, Some(TypeHint::String));
    }

    #[test]
    fn test_introspect_opaque_fails() {
        let callable = FnEndpoint::opaque("mystery", |_| Ok(Value::Null));
        let err = introspect(&callable);
        assert!(matches!(err, Err(BuildError::Introspection { name }) if name == "mystery"));
    }

    #[test]
    fn test_extract_arguments_plain() {
        let s = sig(vec![
            Parameter::required("a"),
            Parameter::required("b"),
            Parameter::with_default("c", Value::Null),
            Parameter::with_default("d", 0),
        ]);
        let kwargs = json!({"b": 2, "a": 1, "c": 3, "d": 4, "extra": "stuff"});
        let got = extract_arguments(&s, kwargs.as_object().unwrap());

        assert!(got.positional.is_empty());
        let keys: Vec<&String> = got.keyword.keys().collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
        assert_eq!(got.remaining.get("extra"), Some(&json!("stuff")));
    }

    #[test]
    fn test_extract_arguments_positional_only() {
        let s = sig(vec![
            Parameter::required("a").kind(ParamKind::PositionalOnly),
            Parameter::required("b").kind(ParamKind::PositionalOnly),
            Parameter::with_default("d", 0),
        ]);
        let kwargs = json!({"b": 2, "a": 1, "d": 4});
        let got = extract_arguments(&s, kwargs.as_object().unwrap());

        // Signature order, not input order
        assert_eq!(got.positional, vec![json!(1), json!(2)]);
        assert_eq!(got.keyword.get("d"), Some(&json!(4)));
        assert!(got.missing_positional.is_empty());
    }

    #[test]
    fn test_extract_arguments_missing_positional() {
        let s = sig(vec![
            Parameter::required("a").kind(ParamKind::PositionalOnly),
            Parameter::with_default("d", 0),
        ]);
        let kwargs = json!({"d": 4});
        let got = extract_arguments(&s, kwargs.as_object().unwrap());
        assert_eq!(got.positional, vec![Value::Null]);
        assert_eq!(got.missing_positional, vec!["a".to_string()]);
    }

    #[test]
    fn test_extract_arguments_var_keyword_folds_remainder() {
        let s = sig(vec![
            Parameter::required("a"),
            Parameter::var_keyword("rest"),
        ]);
        let kwargs = json!({"a": 1, "extra": true});
        let got = extract_arguments(&s, kwargs.as_object().unwrap());
        assert_eq!(got.keyword.get("extra"), Some(&json!(true)));
        assert!(got.remaining.is_empty());
    }

    #[test]
    fn test_empty_signature_extracts_nothing() {
        let got = extract_arguments(
            &Signature::empty(),
            json!({"a": 1}).as_object().unwrap(),
        );
        assert!(got.positional.is_empty() && got.keyword.is_empty());
        assert_eq!(got.remaining.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_literal_hint_admits() {
        let hint = TypeHint::Literal(vec![json!("red"), json!("green")]);
        assert!(hint.admits(&json!("red")));
        assert!(!hint.admits(&json!("blue")));
    }
}
