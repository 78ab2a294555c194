//! JSON Schema validator

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde_json::Value;

use crate::error::{HintGuardError, Result};
use crate::hint::HintKind;
use crate::problem::{ErrorDetail, ProblemReport};

use super::{violations, EngineError, Inputs, Validator};

/// Checks the input mapping against a compiled JSON Schema
pub struct SchemaValidator {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile `schema`; an invalid schema is a setup error
    pub fn new(schema: Value) -> Result<Self> {
        let compiled =
            jsonschema::validator_for(&schema).map_err(|e| HintGuardError::InvalidSchema {
                reason: e.to_string(),
            })?;
        Ok(Self { schema, compiled })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Validator for SchemaValidator {
    fn kind(&self) -> HintKind {
        HintKind::Schema
    }

    fn validate(&self, inputs: &Inputs) -> std::result::Result<Option<ProblemReport>, EngineError> {
        let instance = Value::Object(inputs.clone());
        let errors = self
            .compiled
            .iter_errors(&instance)
            .map(|error| error_detail(&error))
            .collect();
        Ok(violations(errors))
    }
}

/// One detail per violation, pointing at the offending input location
///
/// Missing properties are reported at the location they should occupy
/// (`/aoi`) rather than at their parent.
fn error_detail(error: &ValidationError<'_>) -> ErrorDetail {
    let location = error.instance_path.to_string();
    let pointer = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| property.to_string());
            format!("{}/{}", location, name)
        }
        _ if location.is_empty() => "/".to_string(),
        _ => location,
    };
    ErrorDetail::new(pointer, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(value: Value) -> Inputs {
        match value {
            Value::Object(map) => map,
            _ => panic!("inputs must be a mapping"),
        }
    }

    #[test]
    fn test_missing_required_points_at_property() {
        let validator = SchemaValidator::new(json!({
            "type": "object",
            "required": ["x"]
        }))
        .unwrap();
        let report = validator.validate(&inputs(json!({}))).unwrap().unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].pointer_str(), "/x");
        assert!(report.errors[0].detail.contains("\"x\""));
    }

    #[test]
    fn test_nested_violation_pointer() {
        let validator = SchemaValidator::new(json!({
            "type": "object",
            "properties": {
                "bands": { "type": "array", "items": { "type": "string" } }
            }
        }))
        .unwrap();
        let report = validator
            .validate(&inputs(json!({ "bands": ["red", 4] })))
            .unwrap()
            .unwrap();
        assert_eq!(report.errors[0].pointer_str(), "/bands/1");
    }

    #[test]
    fn test_conforming_inputs_pass() {
        let validator = SchemaValidator::new(json!({
            "type": "object",
            "properties": { "epsg": { "type": "integer" } },
            "required": ["epsg"]
        }))
        .unwrap();
        assert!(validator
            .validate(&inputs(json!({ "epsg": 4326 })))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_schema_is_setup_error() {
        let err = SchemaValidator::new(json!({ "type": "not-a-type" })).unwrap_err();
        assert_eq!(err.code(), "HG-020");
        assert!(err.is_setup_error());
    }
}
