//! Rego policy validator

use regorus::Engine;
use serde_json::Value;

use crate::error::{HintGuardError, Result};
use crate::hint::HintKind;
use crate::problem::{ErrorDetail, ProblemReport};

use super::{violations, EngineError, Inputs, Validator};

/// Path the hint's module is registered under
pub const POLICY_MODULE_PATH: &str = "workflow.rego";

/// Evaluates Rego queries against the input mapping
///
/// The module is parsed once; every validation runs on a fresh clone of
/// the prepared engine so no input leaks between runs.
#[derive(Clone)]
pub struct PolicyValidator {
    engine: Engine,
    queries: Vec<String>,
}

impl PolicyValidator {
    pub fn new(module: &str, queries: Vec<String>) -> Result<Self> {
        let mut engine = Engine::new();
        engine
            .add_policy(POLICY_MODULE_PATH.to_string(), module.to_string())
            .map_err(|e| HintGuardError::InvalidPolicy {
                reason: e.to_string(),
            })?;
        Ok(Self { engine, queries })
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}

impl std::fmt::Debug for PolicyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyValidator")
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}

impl Validator for PolicyValidator {
    fn kind(&self) -> HintKind {
        HintKind::Policy
    }

    fn validate(&self, inputs: &Inputs) -> std::result::Result<Option<ProblemReport>, EngineError> {
        let mut engine = self.engine.clone();

        let input = Value::Object(inputs.clone()).to_string();
        let input = regorus::Value::from_json_str(&input)
            .map_err(|e| EngineError::new(HintKind::Policy, "input", e.to_string()))?;
        engine.set_input(input);

        let mut errors = Vec::new();
        for query in &self.queries {
            let results = engine
                .eval_query(query.clone(), false)
                .map_err(|e| EngineError::new(HintKind::Policy, query, e.to_string()))?;

            // first expression of each row is the violation message
            for row in results.result {
                if let Some(expression) = row.expressions.first() {
                    let detail = render(&expression.value)
                        .map_err(|e| EngineError::new(HintKind::Policy, query, e))?;
                    errors.push(ErrorDetail::new(query, detail));
                }
            }

            tracing::debug!(query = %query, violations = errors.len(), "Evaluated policy query");
        }

        Ok(violations(errors))
    }
}

/// Strings verbatim, anything else as JSON text
fn render(value: &regorus::Value) -> std::result::Result<String, String> {
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        Value::String(text) => Ok(text),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODULE: &str = r#"
package workflow

import rego.v1

deny contains msg if {
    input.epsg != 4326
    msg := sprintf("EPSG %v is not supported", [input.epsg])
}
"#;

    fn inputs(value: Value) -> Inputs {
        match value {
            Value::Object(map) => map,
            _ => panic!("inputs must be a mapping"),
        }
    }

    #[test]
    fn test_query_without_rows_passes() {
        let validator =
            PolicyValidator::new(MODULE, vec!["data.workflow.deny[x]".to_string()]).unwrap();
        assert!(validator
            .validate(&inputs(json!({ "epsg": 4326 })))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_each_row_is_one_violation() {
        let validator =
            PolicyValidator::new(MODULE, vec!["data.workflow.deny[x]".to_string()]).unwrap();
        let report = validator
            .validate(&inputs(json!({ "epsg": 3857 })))
            .unwrap()
            .unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].pointer_str(), "data.workflow.deny[x]");
        assert_eq!(report.errors[0].detail, "EPSG 3857 is not supported");
    }

    #[test]
    fn test_runs_are_isolated() {
        let validator =
            PolicyValidator::new(MODULE, vec!["data.workflow.deny[x]".to_string()]).unwrap();
        assert!(validator
            .validate(&inputs(json!({ "epsg": 3857 })))
            .unwrap()
            .is_some());
        assert!(validator
            .validate(&inputs(json!({ "epsg": 4326 })))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_module_is_setup_error() {
        let err = PolicyValidator::new("package workflow\n deny contains if {", Vec::new())
            .unwrap_err();
        assert_eq!(err.code(), "HG-021");
    }

    #[test]
    fn test_debug_lists_queries() {
        let validator =
            PolicyValidator::new(MODULE, vec!["data.workflow.deny[x]".to_string()]).unwrap();
        let debug = format!("{validator:?}");
        assert!(debug.starts_with("PolicyValidator"));
        assert!(debug.contains("data.workflow.deny[x]"));
    }

    #[test]
    fn test_sprintf_keeps_spacing_around_verbs() {
        let module = r#"
package workflow

import rego.v1

deny contains msg if {
    msg := sprintf("%v is %v", [input.epsg, input.unit])
}
"#;
        let validator =
            PolicyValidator::new(module, vec!["data.workflow.deny[x]".to_string()]).unwrap();
        let report = validator
            .validate(&inputs(json!({ "epsg": 3857, "unit": "metre" })))
            .unwrap()
            .unwrap();
        assert_eq!(report.errors[0].detail, "3857 is metre");
    }

    #[test]
    fn test_malformed_query_is_engine_error() {
        let validator = PolicyValidator::new(MODULE, vec!["data.workflow.[".to_string()]).unwrap();
        let err = validator.validate(&inputs(json!({}))).unwrap_err();
        assert_eq!(err.pointer, "data.workflow.[");
        assert_eq!(err.kind, HintKind::Policy);
    }
}
