//! OpenAPI document builder for composing multiple sources.

use crate::Result;
use crate::error::OpenApiError;
use crate::types::{OpenApiPath, OpenApiSchema};
use serde_json::{Map, Value};

/// Builder for composing OpenAPI documents from route tables and raw specs.
///
/// # Example
///
/// ```ignore
/// use fn2http_openapi::OpenApiBuilder;
///
/// let spec = OpenApiBuilder::new()
///     .title("Calculator API")
///     .version("1.0.0")
///     .server("http://localhost:3030")
///     .merge_paths(paths)
///     .build();
/// ```
///
/// # Conflict Resolution
///
/// - **Paths**: Last write wins (later merges override earlier ones for the
///   same path+method).
/// - **Schemas**: Identical schemas are deduplicated; different schemas with
///   the same name cause an error.
#[derive(Debug, Clone)]
pub struct OpenApiBuilder {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    servers: Vec<String>,
    paths: Map<String, Value>,
    schemas: Map<String, Value>,
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            title: None,
            version: None,
            description: None,
            servers: Vec::new(),
            paths: Map::new(),
            schemas: Map::new(),
        }
    }

    /// Set the API title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the API version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the API description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a server base URL.
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    /// Merge a raw OpenAPI document (as JSON value).
    ///
    /// Extracts paths and component schemas from the document and merges them.
    pub fn merge(mut self, spec: Value) -> Result<Self> {
        if let Some(paths) = spec.get("paths").and_then(|p| p.as_object()) {
            for (path, methods) in paths {
                if let Some(methods_obj) = methods.as_object() {
                    let path_entry = self
                        .paths
                        .entry(path.clone())
                        .or_insert_with(|| Value::Object(Map::new()));

                    if let Some(path_obj) = path_entry.as_object_mut() {
                        for (method, operation) in methods_obj {
                            // Last write wins for paths
                            path_obj.insert(method.clone(), operation.clone());
                        }
                    }
                }
            }
        }

        if let Some(components) = spec.get("components").and_then(|c| c.as_object())
            && let Some(schemas) = components.get("schemas").and_then(|s| s.as_object())
        {
            for (name, schema) in schemas {
                self.merge_schema(name.clone(), schema.clone())?;
            }
        }

        Ok(self)
    }

    /// Merge typed paths.
    pub fn merge_paths(mut self, paths: Vec<OpenApiPath>) -> Self {
        for path_def in paths {
            let path_entry = self
                .paths
                .entry(path_def.path.clone())
                .or_insert_with(|| Value::Object(Map::new()));

            if let Some(path_obj) = path_entry.as_object_mut() {
                let operation = serde_json::to_value(&path_def.operation)
                    .unwrap_or_else(|_| Value::Object(Map::new()));
                path_obj.insert(path_def.method.to_lowercase(), operation);
            }
        }
        self
    }

    /// Merge typed schemas.
    pub fn merge_schemas(mut self, schemas: Vec<OpenApiSchema>) -> Result<Self> {
        for schema_def in schemas {
            self.merge_schema(schema_def.name, schema_def.schema)?;
        }
        Ok(self)
    }

    /// Merge a single schema with conflict detection.
    fn merge_schema(&mut self, name: String, schema: Value) -> Result<()> {
        if let Some(existing) = self.schemas.get(&name) {
            if existing != &schema {
                return Err(OpenApiError::SchemaConflict { name });
            }
            // Identical - already present, nothing to do
        } else {
            self.schemas.insert(name, schema);
        }
        Ok(())
    }

    /// Build the final OpenAPI document.
    pub fn build(self) -> Value {
        let mut spec = Map::new();

        spec.insert("openapi".to_string(), Value::String("3.0.2".to_string()));

        let mut info = Map::new();
        info.insert(
            "title".to_string(),
            Value::String(self.title.unwrap_or_else(|| "API".to_string())),
        );
        info.insert(
            "version".to_string(),
            Value::String(self.version.unwrap_or_else(|| "0.1.0".to_string())),
        );
        if let Some(desc) = self.description {
            info.insert("description".to_string(), Value::String(desc));
        }
        spec.insert("info".to_string(), Value::Object(info));

        if !self.servers.is_empty() {
            let servers = self
                .servers
                .into_iter()
                .map(|url| serde_json::json!({"url": url}))
                .collect();
            spec.insert("servers".to_string(), Value::Array(servers));
        }

        spec.insert("paths".to_string(), Value::Object(self.paths));

        if !self.schemas.is_empty() {
            let mut components = Map::new();
            components.insert("schemas".to_string(), Value::Object(self.schemas));
            spec.insert("components".to_string(), Value::Object(components));
        }

        Value::Object(spec)
    }
}
