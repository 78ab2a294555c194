//! Validators - executable form of a hint
//!
//! Every validator answers one question for one input mapping: does it
//! satisfy the assertions? The answer is either `Ok(None)` (all satisfied),
//! `Ok(Some(report))` (business rule violations) or `Err(EngineError)`
//! when the evaluation engine itself broke down.
//!
//! - `schema`: JSON Schema conformance (`jsonschema`)
//! - `policy`: Rego queries (`regorus`)
//! - `filter`: CQL2 predicates (crate `filter` engine)

mod filter;
mod policy;
mod schema;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::hint::HintKind;
use crate::problem::{ErrorDetail, ProblemReport};

pub use filter::{FilterValidator, CODE_FORMAT, CODE_PARSE};
pub use policy::{PolicyValidator, POLICY_MODULE_PATH};
pub use schema::SchemaValidator;

/// Input values keyed by input id
pub type Inputs = Map<String, Value>;

/// Common validator contract
///
/// Implementations may keep compiled state but must not carry anything
/// from one `validate` call to the next.
pub trait Validator {
    /// Hint kind this validator was built from
    fn kind(&self) -> HintKind;

    /// Check `inputs`; violations are reported, never raised
    fn validate(&self, inputs: &Inputs) -> Result<Option<ProblemReport>, EngineError>;
}

/// Failure of an evaluation engine while running one query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} engine failed on '{pointer}': {message}")]
pub struct EngineError {
    pub kind: HintKind,
    /// Query id, policy query or schema location being evaluated
    pub pointer: String,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: HintKind, pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    /// Render as a server-error problem pointing at the failing query
    pub fn to_problem_report(&self) -> ProblemReport {
        ProblemReport::server_error(
            format!("The {} validator failed to evaluate its assertions.", self.kind),
            vec![ErrorDetail::new(&self.pointer, &self.message)],
        )
    }
}

/// Wrap violations in a report, `None` when there are none
pub(crate) fn violations(errors: Vec<ErrorDetail>) -> Option<ProblemReport> {
    if errors.is_empty() {
        None
    } else {
        Some(ProblemReport::business_rule_violation(errors))
    }
}
