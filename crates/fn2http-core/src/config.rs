//! Per-function configuration with an explicit override chain.
//!
//! Resolution for a function and key walks: callable attributes, then the
//! per-function settings map, then global settings, then library defaults.
//! There is no process-wide mutable default; a `Config` is constructed once
//! at startup and threaded through assembly calls.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BuildError;
use crate::route::{ErrorHandler, InputMapper, JsonEncoder, OutputMapper};
use crate::signature::{ArgMap, Callable};

/// Binds a request header to a callable parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBinding {
    /// Header name (case-insensitive at extraction time).
    pub header: String,
    /// Parameter name the header value is bound to.
    pub param: String,
}

/// Application-wide configuration: JSON-representable settings plus typed
/// registries for mappers, handlers, the encoder hook, and header bindings.
#[derive(Clone, Default)]
pub struct Config {
    defaults: ArgMap,
    global: ArgMap,
    per_func: HashMap<String, ArgMap>,
    input_mappers: HashMap<String, Arc<dyn InputMapper>>,
    global_input_mapper: Option<Arc<dyn InputMapper>>,
    output_mappers: HashMap<String, Arc<dyn OutputMapper>>,
    global_output_mapper: Option<Arc<dyn OutputMapper>>,
    error_handlers: HashMap<String, Arc<dyn ErrorHandler>>,
    global_error_handler: Option<Arc<dyn ErrorHandler>>,
    encoder: Option<Arc<dyn JsonEncoder>>,
    header_inputs: HashMap<String, Vec<HeaderBinding>>,
    global_header_inputs: Vec<HeaderBinding>,
}

impl Config {
    /// A config holding only the library defaults.
    pub fn new() -> Self {
        let mut defaults = ArgMap::new();
        defaults.insert("http_method".into(), Value::String("post".into()));
        defaults.insert("title".into(), Value::String("HTTP Service".into()));
        defaults.insert("version".into(), Value::String("0.1.0".into()));
        defaults.insert("host".into(), Value::String("localhost".into()));
        defaults.insert("port".into(), Value::Number(3030.into()));
        defaults.insert("publish_openapi".into(), Value::Bool(false));
        defaults.insert("debug_errors".into(), Value::Bool(false));
        defaults.insert("result_field".into(), Value::String("result".into()));
        Self {
            defaults,
            ..Default::default()
        }
    }

    /// Override a library default.
    pub fn set_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Set a global setting (applies to every function unless overridden).
    pub fn set_global(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global.insert(key.into(), value.into());
        self
    }

    /// Set a setting for one function by name.
    pub fn set_for(
        mut self,
        func_name: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.per_func
            .entry(func_name.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Merge a nested `{function_name: {setting: value}}` mapping.
    pub fn extend(mut self, settings: HashMap<String, ArgMap>) -> Self {
        for (func_name, map) in settings {
            self.per_func.entry(func_name).or_default().extend(map);
        }
        self
    }

    /// Resolve a setting for a function: callable attrs, then per-function
    /// settings, then globals, then library defaults.
    pub fn resolve(&self, func: &dyn Callable, key: &str) -> Option<Value> {
        if let Some(value) = func.attrs().get(key) {
            return Some(value.clone());
        }
        if let Some(value) = self.per_func.get(func.name()).and_then(|m| m.get(key)) {
            return Some(value.clone());
        }
        if let Some(value) = self.global.get(key) {
            return Some(value.clone());
        }
        self.defaults.get(key).cloned()
    }

    /// Like [`resolve`](Self::resolve), but missing-everywhere is an error.
    pub fn resolve_required(&self, func: &dyn Callable, key: &str) -> Result<Value, BuildError> {
        self.resolve(func, key).ok_or_else(|| BuildError::Configuration {
            key: key.to_string(),
        })
    }

    /// Resolve a setting by bare key with no function in scope (app-level
    /// settings such as the document title).
    pub fn resolve_app(&self, key: &str) -> Option<Value> {
        self.global
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
    }

    pub(crate) fn resolve_app_str(&self, key: &str) -> Option<String> {
        self.resolve_app(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    // Typed registries

    /// Set the input mapper for one function.
    pub fn input_mapper_for(
        mut self,
        func_name: impl Into<String>,
        mapper: Arc<dyn InputMapper>,
    ) -> Self {
        self.input_mappers.insert(func_name.into(), mapper);
        self
    }

    /// Set the global input mapper.
    pub fn input_mapper(mut self, mapper: Arc<dyn InputMapper>) -> Self {
        self.global_input_mapper = Some(mapper);
        self
    }

    /// Set the output mapper for one function.
    pub fn output_mapper_for(
        mut self,
        func_name: impl Into<String>,
        mapper: Arc<dyn OutputMapper>,
    ) -> Self {
        self.output_mappers.insert(func_name.into(), mapper);
        self
    }

    /// Set the global output mapper.
    pub fn output_mapper(mut self, mapper: Arc<dyn OutputMapper>) -> Self {
        self.global_output_mapper = Some(mapper);
        self
    }

    /// Set the error handler for one function.
    pub fn error_handler_for(
        mut self,
        func_name: impl Into<String>,
        handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        self.error_handlers.insert(func_name.into(), handler);
        self
    }

    /// Set the global error handler.
    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.global_error_handler = Some(handler);
        self
    }

    /// Set the JSON encoder hook for opaque return values.
    pub fn encoder(mut self, encoder: Arc<dyn JsonEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Bind a header to a parameter for one function.
    pub fn header_input(
        mut self,
        func_name: impl Into<String>,
        header: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        self.header_inputs
            .entry(func_name.into())
            .or_default()
            .push(HeaderBinding {
                header: header.into(),
                param: param.into(),
            });
        self
    }

    /// Bind a header to a parameter for every function.
    pub fn global_header_input(
        mut self,
        header: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        self.global_header_inputs.push(HeaderBinding {
            header: header.into(),
            param: param.into(),
        });
        self
    }

    pub(crate) fn resolved_input_mapper(&self, func_name: &str) -> Option<Arc<dyn InputMapper>> {
        self.input_mappers
            .get(func_name)
            .or(self.global_input_mapper.as_ref())
            .cloned()
    }

    pub(crate) fn resolved_output_mapper(&self, func_name: &str) -> Option<Arc<dyn OutputMapper>> {
        self.output_mappers
            .get(func_name)
            .or(self.global_output_mapper.as_ref())
            .cloned()
    }

    pub(crate) fn resolved_error_handler(&self, func_name: &str) -> Option<Arc<dyn ErrorHandler>> {
        self.error_handlers
            .get(func_name)
            .or(self.global_error_handler.as_ref())
            .cloned()
    }

    pub(crate) fn resolved_encoder(&self) -> Option<Arc<dyn JsonEncoder>> {
        self.encoder.clone()
    }

    pub(crate) fn resolved_header_inputs(&self, func_name: &str) -> Vec<HeaderBinding> {
        let mut bindings = self.global_header_inputs.clone();
        if let Some(extra) = self.header_inputs.get(func_name) {
            bindings.extend(extra.iter().cloned());
        }
        bindings
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("global", &self.global)
            .field("per_func", &self.per_func)
            .finish_non_exhaustive()
    }
}
