//! Per-workflow validation results

use crate::error::HintGuardError;
use crate::hint::{HintKind, ResolveIssue};
use crate::problem::ProblemReport;
use crate::validate::EngineError;

/// A resolved hint whose validator could not be built
#[derive(Debug)]
pub struct SetupFailure {
    pub kind: HintKind,
    pub annotation: String,
    pub error: HintGuardError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Every assertion held
    Passed,
    /// At least one assertion failed (business rule violation)
    Violated(ProblemReport),
    /// The evaluation engine broke down
    Failed(EngineError),
}

/// Result of running one validator
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub kind: HintKind,
    pub annotation: String,
    pub status: OutcomeStatus,
}

impl Outcome {
    /// Problem report for this outcome; engine failures render as server errors
    pub fn report(&self) -> Option<ProblemReport> {
        match &self.status {
            OutcomeStatus::Passed => None,
            OutcomeStatus::Violated(report) => Some(report.clone()),
            OutcomeStatus::Failed(error) => Some(error.to_problem_report()),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Passed)
    }
}

/// Everything that happened while validating one workflow
#[derive(Debug)]
pub struct WorkflowReport {
    pub workflow: String,
    pub class: String,
    pub version: String,
    /// Hint records declared on the workflow (any namespace)
    pub declared: usize,
    pub resolve_issues: Vec<ResolveIssue>,
    pub setup_failures: Vec<SetupFailure>,
    /// One entry per built validator, in hint declaration order
    pub outcomes: Vec<Outcome>,
}

impl WorkflowReport {
    /// `(kind, report)` per validator, `None` for a pass
    pub fn results(&self) -> Vec<(HintKind, Option<ProblemReport>)> {
        self.outcomes
            .iter()
            .map(|outcome| (outcome.kind, outcome.report()))
            .collect()
    }

    /// Non-empty problem reports only, in order
    pub fn problem_reports(&self) -> Vec<ProblemReport> {
        self.outcomes.iter().filter_map(Outcome::report).collect()
    }

    pub fn has_violations(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, OutcomeStatus::Violated(_)))
    }

    /// Engine failures or validators that could not be set up
    pub fn has_failures(&self) -> bool {
        !self.setup_failures.is_empty()
            || self
                .outcomes
                .iter()
                .any(|o| matches!(o.status, OutcomeStatus::Failed(_)))
    }

    /// No violation and no failure; hints that did not resolve are not counted
    pub fn is_clean(&self) -> bool {
        !self.has_violations() && !self.has_failures()
    }
}
