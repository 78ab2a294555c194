//! Hint resolution - raw hint records -> typed hints
//!
//! Records whose `class` is outside the namespace belong to other consumers
//! and are skipped silently. Records inside the namespace that are unknown
//! or malformed are dropped and reported as [`ResolveIssue`]s; resolution
//! itself never fails.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::ast::Workflow;
use crate::error::{HintGuardError, Result};

use super::{FilterHint, Hint, HintKind, PolicyHint, SchemaHint};

/// Builds a hint from its qualified class name, record fields and owner
pub type HintConstructor = fn(&str, &Map<String, Value>, &Arc<Workflow>) -> Result<Hint>;

/// Namespace assertion hints live in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Compact prefix (`eoap` in `eoap:JSONSchemaHint`)
    pub prefix: String,
    /// Expanded IRI (`https://eoap.ogc.org/`), if known up front
    pub uri: Option<String>,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new("eoap")
    }
}

impl Namespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// `prefix:name`
    pub fn qualified(&self, name: &str) -> String {
        format!("{}:{}", self.prefix, name)
    }

    /// Bare name for a class in this namespace, compact or expanded form
    ///
    /// `declared` are the workflow's `$namespaces`, consulted for the
    /// expanded IRI when none is configured.
    fn bare_name<'a>(
        &self,
        class: &'a str,
        declared: &std::collections::BTreeMap<String, String>,
    ) -> Option<&'a str> {
        if let Some(name) = class
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
        {
            return Some(name);
        }

        let uris = self
            .uri
            .iter()
            .chain(declared.get(&self.prefix))
            .filter(|uri| !uri.is_empty());
        for uri in uris {
            if let Some(name) = class.strip_prefix(uri.as_str()) {
                tracing::debug!(class = %class, uri = %uri, "Mapped expanded hint class");
                return Some(name.trim_start_matches(['#', '/']));
            }
        }
        None
    }
}

/// A hint record that was dropped during resolution
#[derive(Debug)]
pub struct ResolveIssue {
    /// Position of the record in the workflow's hints
    pub index: usize,
    pub class: String,
    pub error: HintGuardError,
}

/// Result of resolving one workflow's hints
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved hints, in declaration order
    pub hints: Vec<Hint>,
    pub issues: Vec<ResolveIssue>,
    /// Number of hint records the workflow declares (any namespace)
    pub declared: usize,
}

impl Resolution {
    /// True when the workflow declares no hint at all
    pub fn is_undeclared(&self) -> bool {
        self.declared == 0
    }
}

/// Maps namespace-qualified class names to hint constructors
#[derive(Debug, Clone)]
pub struct HintRegistry {
    namespace: Namespace,
    constructors: FxHashMap<String, (HintKind, HintConstructor)>,
}

impl Default for HintRegistry {
    fn default() -> Self {
        Self::with_builtin(Namespace::default())
    }
}

impl HintRegistry {
    /// Empty registry for `namespace`
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            constructors: FxHashMap::default(),
        }
    }

    /// Registry with the three built-in kinds
    pub fn with_builtin(namespace: Namespace) -> Self {
        let mut registry = Self::new(namespace);
        registry.register(HintKind::Schema, SchemaHint::from_record);
        registry.register(HintKind::Policy, PolicyHint::from_record);
        registry.register(HintKind::Filter, FilterHint::from_record);
        registry
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register(&mut self, kind: HintKind, constructor: HintConstructor) {
        let name = self.namespace.qualified(kind.class_name());
        self.constructors.insert(name, (kind, constructor));
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Qualified class names known to this registry
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the workflow's hint records, preserving their order
    pub fn resolve(&self, workflow: &Arc<Workflow>) -> Resolution {
        let mut resolution = Resolution {
            declared: workflow.hints.len(),
            ..Resolution::default()
        };

        if workflow.hints.is_empty() {
            tracing::debug!(workflow = %workflow.id, "No hints declared");
            return resolution;
        }

        for (index, raw) in workflow.hints.iter().enumerate() {
            let Some(record) = raw.as_object() else {
                continue;
            };
            let Some(class) = record.get("class").and_then(Value::as_str) else {
                continue;
            };

            tracing::debug!(workflow = %workflow.id, index, class = %class, "Analysing hint");

            let Some(name) = self.namespace.bare_name(class, &workflow.namespaces) else {
                continue;
            };

            let qualified = self.namespace.qualified(name);
            let result = match self.constructors.get(&qualified) {
                Some((_, constructor)) => constructor(&qualified, record, workflow),
                None => Err(HintGuardError::UnknownHintKind {
                    class: class.to_string(),
                }),
            };

            match result {
                Ok(hint) => resolution.hints.push(hint),
                Err(error) => {
                    tracing::error!(
                        workflow = %workflow.id,
                        index,
                        class = %class,
                        error = %error,
                        "Dropping hint"
                    );
                    resolution.issues.push(ResolveIssue {
                        index,
                        class: class.to_string(),
                        error,
                    });
                }
            }
        }

        resolution
    }
}

/// Resolve with the built-in `eoap` registry, dropping issue records
pub fn resolve_hints(workflow: &Arc<Workflow>) -> Vec<Hint> {
    HintRegistry::default().resolve(workflow).hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_hint(prefix: &str) -> Value {
        json!({ "class": format!("{}:JSONSchemaHint", prefix), "json_schema": { "type": "object" } })
    }

    #[test]
    fn test_foreign_hints_are_skipped_silently() {
        let wf = Arc::new(
            Workflow::new("main", "Workflow")
                .with_hint(json!({ "class": "DockerRequirement", "dockerPull": "alpine" }))
                .with_hint(json!("opaque"))
                .with_hint(schema_hint("eoap")),
        );
        let resolution = HintRegistry::default().resolve(&wf);
        assert_eq!(resolution.hints.len(), 1);
        assert!(resolution.issues.is_empty());
        assert_eq!(resolution.declared, 3);
    }

    #[test]
    fn test_unknown_kind_is_an_issue() {
        let wf = Arc::new(
            Workflow::new("main", "Workflow")
                .with_hint(json!({ "class": "eoap:XmlSchemaHint" }))
                .with_hint(schema_hint("eoap")),
        );
        let resolution = HintRegistry::default().resolve(&wf);
        assert_eq!(resolution.hints.len(), 1);
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].index, 0);
        assert_eq!(resolution.issues[0].error.code(), "HG-011");
    }

    #[test]
    fn test_expanded_namespace_from_document() {
        let wf = Arc::new(
            Workflow::new("main", "Workflow")
                .with_namespace("eoap", "https://eoap.ogc.org/")
                .with_hint(json!({
                    "class": "https://eoap.ogc.org/Cql2FilterHint",
                    "queries": []
                })),
        );
        let hints = resolve_hints(&wf);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].annotation(), "eoap:Cql2FilterHint");
    }

    #[test]
    fn test_configured_prefix() {
        let registry = HintRegistry::with_builtin(Namespace::new("assert"));
        let wf = Arc::new(
            Workflow::new("main", "Workflow")
                .with_hint(schema_hint("eoap"))
                .with_hint(schema_hint("assert")),
        );
        let resolution = registry.resolve(&wf);
        assert_eq!(resolution.hints.len(), 1);
        assert_eq!(resolution.hints[0].annotation(), "assert:JSONSchemaHint");
        assert_eq!(
            registry.class_names(),
            vec!["assert:Cql2FilterHint", "assert:JSONSchemaHint", "assert:RegoPolicyHint"]
        );
    }

    #[test]
    fn test_no_hints_is_undeclared() {
        let wf = Arc::new(Workflow::new("main", "Workflow"));
        let resolution = HintRegistry::default().resolve(&wf);
        assert!(resolution.is_undeclared());
        assert!(resolution.hints.is_empty());
    }
}
