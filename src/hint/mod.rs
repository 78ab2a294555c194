//! Hint Module - assertion hints attached to workflows
//!
//! Three kinds of assertions are understood:
//!
//! | Class | Profile | Validator |
//! |-------|---------|-----------|
//! | `eoap:JSONSchemaHint` | `eoap.ogc.org/inputs-json-schema` | [`SchemaValidator`] |
//! | `eoap:RegoPolicyHint` | `eoap.ogc.org/inputs-rego-policy` | [`PolicyValidator`] |
//! | `eoap:Cql2FilterHint` | `eoap.ogc.org/inputs-cql2-filter` | [`FilterValidator`] |
//!
//! A [`Hint`] is immutable once built and owns the sole authority to build
//! its validator. Schema hints without an inline `json_schema` derive their
//! schema from the workflow's declared inputs when the validator is built.
//!
//! Resolution from raw records lives in `registry`.

mod registry;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::ast::Workflow;
use crate::convert::InputSchemaConverter;
use crate::error::{HintGuardError, Result};
use crate::validate::{FilterValidator, PolicyValidator, SchemaValidator, Validator};

pub use registry::{
    resolve_hints, HintConstructor, HintRegistry, Namespace, Resolution, ResolveIssue,
};

// ═══════════════════════════════════════════════════════════════════════════
// HINT KINDS
// ═══════════════════════════════════════════════════════════════════════════

/// The closed set of assertion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Schema,
    Policy,
    Filter,
}

impl HintKind {
    pub const ALL: [HintKind; 3] = [HintKind::Schema, HintKind::Policy, HintKind::Filter];

    /// Bare class name, without namespace prefix
    pub const fn class_name(self) -> &'static str {
        match self {
            HintKind::Schema => "JSONSchemaHint",
            HintKind::Policy => "RegoPolicyHint",
            HintKind::Filter => "Cql2FilterHint",
        }
    }

    /// Profile identifier reported alongside outcomes
    pub const fn profile(self) -> &'static str {
        match self {
            HintKind::Schema => "eoap.ogc.org/inputs-json-schema",
            HintKind::Policy => "eoap.ogc.org/inputs-rego-policy",
            HintKind::Filter => "eoap.ogc.org/inputs-cql2-filter",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            HintKind::Schema => "JSON Schema",
            HintKind::Policy => "Rego policy",
            HintKind::Filter => "CQL2 filter",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_name() == name)
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HINT PAYLOADS
// ═══════════════════════════════════════════════════════════════════════════

/// Where a schema hint gets its schema from
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSource {
    /// Schema stated in the declaration
    Literal(Value),
    /// Converted from the workflow's input types at build time
    DerivedFrom(Arc<Workflow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHint {
    pub annotation: String,
    pub source: SchemaSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyHint {
    pub annotation: String,
    /// Rego module source
    pub module: String,
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterHint {
    pub annotation: String,
    pub queries: Vec<FilterQuery>,
}

/// One named CQL2 assertion
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub id: String,
    pub cql2: Cql2Expression,
    /// Reported when the filter evaluates to false
    pub message: String,
}

/// CQL2 encoding, detected from the declared value's shape
#[derive(Debug, Clone, PartialEq)]
pub enum Cql2Expression {
    Text(String),
    Json(Map<String, Value>),
    /// Neither text nor a mapping; reported by the validator
    Unrecognized(Value),
}

impl Cql2Expression {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => Self::Json(map),
            other => Self::Unrecognized(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Json(map) => Value::Object(map.clone()),
            Self::Unrecognized(value) => value.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DECLARATION RECORDS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct PolicyRecord {
    module: String,
    queries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FilterRecord {
    queries: Vec<FilterQueryRecord>,
}

#[derive(Debug, Deserialize)]
struct FilterQueryRecord {
    id: String,
    cql2: Value,
    message: String,
}

fn decode<T: DeserializeOwned>(annotation: &str, record: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(record.clone())).map_err(|e| {
        HintGuardError::InvalidHint {
            class: annotation.to_string(),
            reason: e.to_string(),
        }
    })
}

impl SchemaHint {
    /// Inline `json_schema` wins; otherwise derive from `workflow`
    pub fn from_record(
        annotation: &str,
        record: &Map<String, Value>,
        workflow: &Arc<Workflow>,
    ) -> Result<Hint> {
        let source = match record.get("json_schema") {
            Some(schema @ (Value::Object(_) | Value::Bool(_))) => {
                SchemaSource::Literal(schema.clone())
            }
            Some(Value::Null) | None => SchemaSource::DerivedFrom(Arc::clone(workflow)),
            Some(other) => {
                return Err(HintGuardError::InvalidHint {
                    class: annotation.to_string(),
                    reason: format!("'json_schema' must be a mapping, got {}", other),
                })
            }
        };
        Ok(Hint::Schema(SchemaHint {
            annotation: annotation.to_string(),
            source,
        }))
    }
}

impl PolicyHint {
    pub fn from_record(
        annotation: &str,
        record: &Map<String, Value>,
        _workflow: &Arc<Workflow>,
    ) -> Result<Hint> {
        let PolicyRecord { module, queries } = decode(annotation, record)?;
        Ok(Hint::Policy(PolicyHint {
            annotation: annotation.to_string(),
            module,
            queries,
        }))
    }
}

impl FilterHint {
    /// Query ids must be unique within the hint
    pub fn from_record(
        annotation: &str,
        record: &Map<String, Value>,
        _workflow: &Arc<Workflow>,
    ) -> Result<Hint> {
        let FilterRecord { queries } = decode(annotation, record)?;

        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(queries.len());
        for query in queries {
            if !seen.insert(query.id.clone()) {
                return Err(HintGuardError::DuplicateQueryId {
                    class: annotation.to_string(),
                    id: query.id,
                });
            }
            parsed.push(FilterQuery {
                id: query.id,
                cql2: Cql2Expression::from_value(query.cql2),
                message: query.message,
            });
        }

        Ok(Hint::Filter(FilterHint {
            annotation: annotation.to_string(),
            queries: parsed,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HINT
// ═══════════════════════════════════════════════════════════════════════════

/// A resolved assertion hint
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    Schema(SchemaHint),
    Policy(PolicyHint),
    Filter(FilterHint),
}

impl Hint {
    pub fn kind(&self) -> HintKind {
        match self {
            Hint::Schema(_) => HintKind::Schema,
            Hint::Policy(_) => HintKind::Policy,
            Hint::Filter(_) => HintKind::Filter,
        }
    }

    /// Namespace-qualified class the hint was resolved under
    pub fn annotation(&self) -> &str {
        match self {
            Hint::Schema(h) => &h.annotation,
            Hint::Policy(h) => &h.annotation,
            Hint::Filter(h) => &h.annotation,
        }
    }

    /// Serialize back to the record form, `class` included
    ///
    /// Derived schemas are converted, so the declaration carries the
    /// schema the validator would check against.
    pub fn to_declaration(&self, converter: &dyn InputSchemaConverter) -> Result<Value> {
        let declaration = match self {
            Hint::Schema(hint) => json!({
                "class": hint.annotation,
                "json_schema": hint.effective_schema(converter)?,
            }),
            Hint::Policy(hint) => json!({
                "class": hint.annotation,
                "module": hint.module,
                "queries": hint.queries,
            }),
            Hint::Filter(hint) => json!({
                "class": hint.annotation,
                "queries": hint
                    .queries
                    .iter()
                    .map(|q| json!({ "id": q.id, "cql2": q.cql2.to_value(), "message": q.message }))
                    .collect::<Vec<_>>(),
            }),
        };
        Ok(declaration)
    }

    /// Build the validator; failures are setup errors for the caller to isolate
    pub fn build_validator(&self, converter: &dyn InputSchemaConverter) -> Result<Box<dyn Validator>> {
        match self {
            Hint::Schema(hint) => {
                let schema = hint.effective_schema(converter)?;
                Ok(Box::new(SchemaValidator::new(schema)?))
            }
            Hint::Policy(hint) => Ok(Box::new(PolicyValidator::new(
                &hint.module,
                hint.queries.clone(),
            )?)),
            Hint::Filter(hint) => Ok(Box::new(FilterValidator::new(&hint.queries))),
        }
    }
}

impl SchemaHint {
    /// Literal schema, or the workflow's inputs converted now
    pub fn effective_schema(&self, converter: &dyn InputSchemaConverter) -> Result<Value> {
        match &self.source {
            SchemaSource::Literal(schema) => Ok(schema.clone()),
            SchemaSource::DerivedFrom(workflow) => converter.inputs_schema(workflow),
        }
    }
}
