//! Input type conversion - CWL input declarations -> JSON Schema
//!
//! Derived schema hints ask for this conversion when their validator is
//! built, so the schema always reflects the workflow's current inputs.
//!
//! | CWL type | JSON Schema |
//! |----------|-------------|
//! | `string` | `{"type": "string"}` |
//! | `int`, `long` | `{"type": "integer"}` |
//! | `float`, `double` | `{"type": "number"}` |
//! | `boolean` | `{"type": "boolean"}` |
//! | `File`, `Directory` | URI string or `{class: File/Directory}` object |
//! | `Any` | `{}` |
//! | `T?`, `[null, T]` | optional `T` |
//! | `T[]`, `{type: array}` | `{"type": "array", "items": T}` |
//! | `{type: enum}` | `{"type": "string", "enum": [...]}` |
//! | `{type: record}` | `{"type": "object", "properties": ...}` |

use serde_json::{json, Map, Value};

use crate::ast::{short_name, Workflow};
use crate::error::{HintGuardError, Result};

/// Converts a workflow's declared inputs into a JSON Schema
pub trait InputSchemaConverter {
    fn inputs_schema(&self, workflow: &Workflow) -> Result<Value>;
}

/// Default converter for CWL type declarations
#[derive(Debug, Clone, Copy, Default)]
pub struct CwlTypeConverter;

impl InputSchemaConverter for CwlTypeConverter {
    fn inputs_schema(&self, workflow: &Workflow) -> Result<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for input in &workflow.inputs {
            let (mut schema, optional) = convert_type(&input.id, &input.input_type)?;

            if let Value::Object(ref mut fields) = schema {
                if let Some(label) = &input.label {
                    fields.insert("title".to_string(), Value::String(label.clone()));
                }
                if let Some(doc) = &input.doc {
                    fields.insert("description".to_string(), Value::String(doc.clone()));
                }
                if let Some(default) = &input.default {
                    fields.insert("default".to_string(), default.clone());
                }
            }

            if !optional && input.default.is_none() {
                required.push(Value::String(input.id.clone()));
            }
            properties.insert(input.id.clone(), schema);
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Ok(Value::Object(schema))
    }
}

/// Convert one CWL type; the flag tells whether `null` is accepted
fn convert_type(input: &str, cwl_type: &Value) -> Result<(Value, bool)> {
    match cwl_type {
        Value::String(name) => convert_named(input, name),
        Value::Array(union) => {
            let mut optional = union.iter().any(|t| t.as_str() == Some("null"));
            let mut members = Vec::new();
            for member in union.iter().filter(|t| t.as_str() != Some("null")) {
                let (schema, member_optional) = convert_type(input, member)?;
                optional |= member_optional;
                members.push(schema);
            }
            match members.len() {
                0 => Ok((json!({ "type": "null" }), true)),
                1 => Ok((members.remove(0), optional)),
                _ => Ok((json!({ "anyOf": members }), optional)),
            }
        }
        Value::Object(decl) => convert_record_type(input, decl),
        Value::Null => Err(HintGuardError::TypeConversion {
            input: input.to_string(),
            reason: "input has no declared type".to_string(),
        }),
        other => Err(HintGuardError::TypeConversion {
            input: input.to_string(),
            reason: format!("unsupported type declaration {}", other),
        }),
    }
}

fn convert_named(input: &str, name: &str) -> Result<(Value, bool)> {
    if let Some(inner) = name.strip_suffix('?') {
        let (schema, _) = convert_named(input, inner)?;
        return Ok((schema, true));
    }
    if let Some(inner) = name.strip_suffix("[]") {
        let (items, _) = convert_named(input, inner)?;
        return Ok((json!({ "type": "array", "items": items }), false));
    }

    let schema = match name {
        "string" => json!({ "type": "string" }),
        "int" | "long" => json!({ "type": "integer" }),
        "float" | "double" => json!({ "type": "number" }),
        "boolean" => json!({ "type": "boolean" }),
        "File" => location_schema("File"),
        "Directory" => location_schema("Directory"),
        "Any" => json!({}),
        "null" => return Ok((json!({ "type": "null" }), true)),
        other => {
            return Err(HintGuardError::TypeConversion {
                input: input.to_string(),
                reason: format!("unsupported CWL type '{}'", other),
            })
        }
    };
    Ok((schema, false))
}

fn convert_record_type(input: &str, decl: &Map<String, Value>) -> Result<(Value, bool)> {
    match decl.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = decl.get("items").ok_or_else(|| HintGuardError::TypeConversion {
                input: input.to_string(),
                reason: "array type without 'items'".to_string(),
            })?;
            let (items, _) = convert_type(input, items)?;
            Ok((json!({ "type": "array", "items": items }), false))
        }
        Some("enum") => {
            let symbols: Vec<Value> = decl
                .get("symbols")
                .and_then(Value::as_array)
                .map(|symbols| {
                    symbols
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| Value::String(short_name(s).to_string()))
                        .collect()
                })
                .unwrap_or_default();
            Ok((json!({ "type": "string", "enum": symbols }), false))
        }
        Some("record") => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for (name, field_type) in record_fields(decl.get("fields")) {
                let (schema, optional) = convert_type(input, &field_type)?;
                if !optional {
                    required.push(Value::String(name.clone()));
                }
                properties.insert(name, schema);
            }
            Ok((
                json!({ "type": "object", "properties": properties, "required": required }),
                false,
            ))
        }
        // `{type: int?}` style wrappers around a plain type
        Some(_) | None => match decl.get("type") {
            Some(inner) if !inner.is_object() => convert_type(input, inner),
            _ => Err(HintGuardError::TypeConversion {
                input: input.to_string(),
                reason: "unrecognized type declaration".to_string(),
            }),
        },
    }
}

fn record_fields(fields: Option<&Value>) -> Vec<(String, Value)> {
    match fields {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|field| {
                let name = field.get("name").and_then(Value::as_str)?;
                let field_type = field.get("type").cloned().unwrap_or(Value::Null);
                Some((short_name(name).to_string(), field_type))
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, decl)| {
                let field_type = match decl {
                    Value::Object(d) => d.get("type").cloned().unwrap_or(Value::Null),
                    other => other.clone(),
                };
                (short_name(name).to_string(), field_type)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn location_schema(class: &str) -> Value {
    json!({
        "anyOf": [
            { "type": "string", "format": "uri" },
            {
                "type": "object",
                "required": ["class"],
                "properties": {
                    "class": { "const": class },
                    "location": { "type": "string" },
                    "path": { "type": "string" }
                }
            }
        ]
    })
}
