//! Per-parameter validation/documentation schema derived from a signature.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BuildError, ValidationError};
use crate::signature::{ArgMap, ParamKind, Parameter, Signature, TypeHint};

/// The schema entry for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// Required iff the parameter has no default.
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Type constraint; `None` means unconstrained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<TypeHint>,
    /// The originating parameter, when `include_source_param` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Parameter>,
}

impl FieldSchema {
    /// The OpenAPI schema fragment for this field.
    pub fn json_schema(&self) -> Value {
        match &self.hint {
            Some(hint) => hint.json_schema(),
            None => serde_json::json!({}),
        }
    }
}

/// Ordered per-parameter schema, positionally consistent with the signature
/// it was derived from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of required fields, in schema order.
    pub fn required_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Validate an argument map against this schema.
    pub fn validate(&self, args: &ArgMap) -> Result<(), ValidationError> {
        for field in &self.fields {
            match args.get(&field.name) {
                None if field.required => {
                    return Err(ValidationError::MissingRequired {
                        name: field.name.clone(),
                    });
                }
                None => {}
                Some(value) => {
                    if let Some(hint) = &field.hint
                        && !hint.admits(value)
                    {
                        return Err(match hint {
                            TypeHint::Literal(_) => ValidationError::NotInEnum {
                                name: field.name.clone(),
                            },
                            _ => ValidationError::TypeMismatch {
                                name: field.name.clone(),
                                expected: hint.describe(),
                            },
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Insert defaults for absent optional fields.
    pub fn fill_defaults(&self, args: &mut ArgMap) {
        for field in &self.fields {
            if let Some(default) = &field.default
                && !args.contains_key(&field.name)
            {
                args.insert(field.name.clone(), default.clone());
            }
        }
    }
}

/// Options for [`derive_schema`].
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    /// Parameter names to leave out of the schema (e.g. header-bound ones).
    pub exclude_keys: BTreeSet<String>,
    /// Carry the originating [`Parameter`] in each field.
    pub include_source_param: bool,
    /// Map variadic parameters to catch-all array/object fields instead of
    /// rejecting them.
    pub catch_all_variadics: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            exclude_keys: BTreeSet::new(),
            include_source_param: true,
            catch_all_variadics: false,
        }
    }
}

impl SchemaOptions {
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.exclude_keys.insert(key.into());
        self
    }

    pub fn exclude_all<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn include_source_param(mut self, include: bool) -> Self {
        self.include_source_param = include;
        self
    }

    pub fn catch_all_variadics(mut self, enabled: bool) -> Self {
        self.catch_all_variadics = enabled;
        self
    }
}

/// Derive the validation schema for a signature.
///
/// Required iff no default; the type constraint comes from the annotation if
/// present, else is inferred from the default's JSON type, else is left
/// unconstrained. Literal annotations become enumerated constraints. Bare
/// variadic parameters are rejected unless `catch_all_variadics` maps them to
/// catch-all array/object fields.
///
/// Deterministic: equal signatures and options derive equal schemas.
pub fn derive_schema(signature: &Signature, options: &SchemaOptions) -> Result<Schema, BuildError> {
    let mut fields = Vec::new();

    for param in signature.params() {
        if options.exclude_keys.contains(&param.name) {
            continue;
        }

        let hint = if param.kind.is_variadic() {
            if !options.catch_all_variadics {
                return Err(BuildError::UnsupportedParameterKind {
                    name: param.name.clone(),
                    kind: param.kind.as_str().to_string(),
                });
            }
            Some(match param.kind {
                ParamKind::VarPositional => TypeHint::Array,
                _ => TypeHint::Object,
            })
        } else {
            param.hint.clone().or_else(|| {
                param.default.as_ref().and_then(TypeHint::from_value)
            })
        };

        fields.push(FieldSchema {
            name: param.name.clone(),
            // Variadic catch-alls are never required
            required: param.is_required() && !param.kind.is_variadic(),
            default: param.default.clone(),
            hint,
            source: options.include_source_param.then(|| param.clone()),
        });
    }

    Ok(Schema { fields })
}
