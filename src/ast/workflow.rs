//! Workflow Types - the process fields hint resolution needs
//!
//! Contains the YAML-parsed types:
//! - `Workflow`: one CWL process (Workflow, CommandLineTool, ...) with its hints
//! - `InputParameter`: a declared input with its raw CWL type
//!
//! Only `id`, `class`, `cwlVersion`, `inputs` and `hints` are read; every
//! other process field is ignored.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{HintGuardError, Result};

/// Workflow parsed from YAML (raw)
#[derive(Debug, Deserialize)]
struct WorkflowRaw {
    #[serde(default)]
    id: Option<String>,
    class: String,
    #[serde(default, rename = "cwlVersion")]
    cwl_version: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    doc: Option<Value>,
    #[serde(default)]
    inputs: Value,
    #[serde(default)]
    hints: Value,
}

/// A declared workflow input
#[derive(Debug, Clone, PartialEq)]
pub struct InputParameter {
    /// Short id (`#main/aoi` -> `aoi`)
    pub id: String,
    /// Raw CWL type declaration (`string`, `int?`, `File[]`, `{type: enum, ...}`, ...)
    pub input_type: Value,
    pub default: Option<Value>,
    pub label: Option<String>,
    pub doc: Option<String>,
}

/// One process of a CWL document
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub class: String,
    pub cwl_version: Option<String>,
    pub label: Option<String>,
    pub doc: Option<String>,
    pub inputs: Vec<InputParameter>,
    /// Hint records in declaration order. Map-form hints are normalised
    /// to `{class: Name, ...fields}` records; other values pass through.
    pub hints: Vec<Value>,
    /// Document-level `$namespaces` (prefix -> IRI)
    pub namespaces: BTreeMap<String, String>,
}

impl Workflow {
    /// Create an empty process
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            cwl_version: None,
            label: None,
            doc: None,
            inputs: Vec::new(),
            hints: Vec::new(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.cwl_version = Some(version.into());
        self
    }

    pub fn with_hint(mut self, hint: Value) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn with_input(mut self, id: impl Into<String>, input_type: Value) -> Self {
        self.inputs.push(InputParameter {
            id: id.into(),
            input_type,
            default: None,
            label: None,
            doc: None,
        });
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), iri.into());
        self
    }

    /// Build a process from its parsed YAML mapping
    ///
    /// `default_version` is the document-level `cwlVersion` for `$graph` entries.
    pub fn from_value(value: Value, default_version: Option<&str>) -> Result<Self> {
        let raw: WorkflowRaw =
            serde_json::from_value(value).map_err(|e| HintGuardError::InvalidDocument {
                reason: e.to_string(),
            })?;

        Ok(Self {
            id: raw.id.unwrap_or_else(|| "main".to_string()),
            class: raw.class,
            cwl_version: raw.cwl_version.or_else(|| default_version.map(String::from)),
            label: raw.label,
            doc: raw.doc.as_ref().and_then(doc_text),
            inputs: normalize_inputs(raw.inputs)?,
            hints: normalize_hints(raw.hints),
            namespaces: BTreeMap::new(),
        })
    }

    /// Id without document prefix (`file.cwl#main` -> `main`)
    pub fn short_id(&self) -> &str {
        self.id.rsplit('#').next().unwrap_or(&self.id)
    }

    /// Version string for logs
    pub fn version(&self) -> &str {
        self.cwl_version.as_deref().unwrap_or("unknown")
    }

    pub fn input(&self, id: &str) -> Option<&InputParameter> {
        self.inputs.iter().find(|i| i.id == id)
    }
}

/// Strip `#main/` style prefixes from an id
pub fn short_name(id: &str) -> &str {
    let tail = id.rsplit('#').next().unwrap_or(id);
    tail.rsplit('/').next().unwrap_or(tail)
}

fn doc_text(doc: &Value) -> Option<String> {
    match doc {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

/// Inputs come as a list of `{id, type}` records or an `id -> type | {type}` map
fn normalize_inputs(inputs: Value) -> Result<Vec<InputParameter>> {
    match inputs {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                let Value::Object(fields) = item else {
                    return Err(HintGuardError::InvalidDocument {
                        reason: "input declarations must be mappings".to_string(),
                    });
                };
                let id = fields
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| HintGuardError::InvalidDocument {
                        reason: "input declaration without 'id'".to_string(),
                    })?
                    .to_string();
                Ok(input_from_fields(&id, fields))
            })
            .collect(),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(id, decl)| match decl {
                Value::Object(fields) => input_from_fields(&id, fields),
                shorthand => InputParameter {
                    id: short_name(&id).to_string(),
                    input_type: shorthand,
                    default: None,
                    label: None,
                    doc: None,
                },
            })
            .collect()),
        other => Err(HintGuardError::InvalidDocument {
            reason: format!("'inputs' must be a list or a mapping, got {}", other),
        }),
    }
}

fn input_from_fields(id: &str, mut fields: Map<String, Value>) -> InputParameter {
    InputParameter {
        id: short_name(id).to_string(),
        input_type: fields.remove("type").unwrap_or(Value::Null),
        default: fields.remove("default"),
        label: fields
            .remove("label")
            .and_then(|v| v.as_str().map(String::from)),
        doc: fields.remove("doc").as_ref().and_then(doc_text),
    }
}

/// Hints come as a list of records or a `Class -> fields` map
fn normalize_hints(hints: Value) -> Vec<Value> {
    match hints {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .map(|(class, fields)| {
                let mut record = match fields {
                    Value::Object(fields) => fields,
                    _ => Map::new(),
                };
                record.insert("class".to_string(), Value::String(class));
                Value::Object(record)
            })
            .collect(),
        other => vec![other],
    }
}
