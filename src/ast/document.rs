//! Document loading - CWL documents and input mappings
//!
//! A document is either a single process or a `$graph` of processes.
//! Every process is validated independently.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{HintGuardError, Result};

use super::workflow::Workflow;

/// A loaded CWL document
#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    pub cwl_version: Option<String>,
    /// Document-level `$namespaces` (prefix -> IRI)
    pub namespaces: BTreeMap<String, String>,
    /// Processes in document order
    pub processes: Vec<Arc<Workflow>>,
}

impl WorkflowDocument {
    pub fn process(&self, id: &str) -> Option<&Arc<Workflow>> {
        self.processes
            .iter()
            .find(|p| p.id == id || p.short_id() == id)
    }
}

/// Parse a CWL document from YAML/JSON text
pub fn parse_document(text: &str) -> Result<WorkflowDocument> {
    let root: Value = serde_yaml::from_str(text).map_err(|e| HintGuardError::DocumentParse {
        details: e.to_string(),
    })?;

    let Value::Object(mut root) = root else {
        return Err(HintGuardError::InvalidDocument {
            reason: "document root must be a mapping".to_string(),
        });
    };

    let cwl_version = root
        .get("cwlVersion")
        .and_then(Value::as_str)
        .map(String::from);
    let namespaces: BTreeMap<String, String> = match root.remove("$namespaces") {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(prefix, iri)| iri.as_str().map(|iri| (prefix, iri.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    };

    let raw_processes = match root.remove("$graph") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(HintGuardError::InvalidDocument {
                reason: format!("'$graph' must be a list, got {}", other),
            })
        }
        None => vec![Value::Object(root)],
    };

    let mut processes = Vec::with_capacity(raw_processes.len());
    for raw in raw_processes {
        let mut process = Workflow::from_value(raw, cwl_version.as_deref())?;
        process.namespaces = namespaces.clone();
        processes.push(Arc::new(process));
    }

    Ok(WorkflowDocument {
        cwl_version,
        namespaces,
        processes,
    })
}

/// Load a CWL document from disk
pub fn load_document(path: &Path) -> Result<WorkflowDocument> {
    if !path.exists() {
        return Err(HintGuardError::DocumentNotFound {
            path: path.display().to_string(),
        });
    }
    let text = fs::read_to_string(path)?;
    parse_document(&text)
}

/// Parse an inputs mapping from YAML/JSON text
///
/// An empty document is an empty mapping.
pub fn parse_inputs(text: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_yaml::from_str(text)?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(HintGuardError::InvalidInputs {
            reason: format!("expected a mapping, got {}", value_type(&other)),
        }),
    }
}

/// Load an inputs mapping from disk
pub fn load_inputs(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Err(HintGuardError::DocumentNotFound {
            path: path.display().to_string(),
        });
    }
    let text = fs::read_to_string(path)?;
    parse_inputs(&text)
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
