//! Orchestrator - resolve, build and run every validator of a workflow
//!
//! Three error policies meet here:
//! - resolution issues are collected by the registry and never stop the run
//! - build failures are isolated per hint as [`SetupFailure`]s
//! - engine failures are isolated per validator as [`OutcomeStatus::Failed`]
//!
//! Validators run sequentially in hint declaration order; none of them
//! sees another's result.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::ast::{Workflow, WorkflowDocument};
use crate::convert::{CwlTypeConverter, InputSchemaConverter};
use crate::hint::{HintKind, HintRegistry};
use crate::validate::{Inputs, Validator};

use super::outcome::{Outcome, OutcomeStatus, SetupFailure, WorkflowReport};

pub struct Orchestrator {
    registry: HintRegistry,
    converter: Box<dyn InputSchemaConverter>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(HintRegistry::default())
    }
}

impl Orchestrator {
    pub fn new(registry: HintRegistry) -> Self {
        Self {
            registry,
            converter: Box::new(CwlTypeConverter),
        }
    }

    /// Replace the converter used for derived schemas
    pub fn with_converter(mut self, converter: impl InputSchemaConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn registry(&self) -> &HintRegistry {
        &self.registry
    }

    /// Validate every process of a document against the same inputs
    pub fn validate_document(
        &self,
        document: &WorkflowDocument,
        inputs: &Inputs,
    ) -> Vec<WorkflowReport> {
        document
            .processes
            .iter()
            .map(|workflow| self.validate_workflow(workflow, inputs))
            .collect()
    }

    #[instrument(skip_all, fields(workflow = %workflow.id))]
    pub fn validate_workflow(&self, workflow: &Arc<Workflow>, inputs: &Inputs) -> WorkflowReport {
        info!(
            "Validating #{} {} ({})",
            workflow.short_id(),
            workflow.class,
            workflow.version()
        );

        let resolution = self.registry.resolve(workflow);

        let mut setup_failures = Vec::new();
        let mut validators: Vec<(HintKind, String, Box<dyn Validator>)> = Vec::new();
        for hint in &resolution.hints {
            match hint.build_validator(self.converter.as_ref()) {
                Ok(validator) => {
                    info!(hint = %hint.annotation(), "{} validator set up", hint.kind());
                    validators.push((hint.kind(), hint.annotation().to_string(), validator));
                }
                Err(e) => {
                    error!(hint = %hint.annotation(), error = %e, "Validator setup failed");
                    setup_failures.push(SetupFailure {
                        kind: hint.kind(),
                        annotation: hint.annotation().to_string(),
                        error: e,
                    });
                }
            }
        }

        if validators.is_empty() {
            info!("No Validators configured");
        }

        let mut outcomes = Vec::with_capacity(validators.len());
        for (kind, annotation, validator) in validators {
            debug!(hint = %annotation, profile = kind.profile(), "Running {} validator", kind);

            let status = match validator.validate(inputs) {
                Ok(None) => {
                    info!(hint = %annotation, "{} assertions hold", kind);
                    OutcomeStatus::Passed
                }
                Ok(Some(report)) => {
                    for detail in &report.errors {
                        error!(hint = %annotation, "[{}] {}", detail.pointer_str(), detail.detail);
                    }
                    OutcomeStatus::Violated(report)
                }
                Err(e) => {
                    error!(
                        hint = %annotation,
                        query = %e.pointer,
                        error = %e.message,
                        "{} engine failure",
                        kind
                    );
                    OutcomeStatus::Failed(e)
                }
            };

            outcomes.push(Outcome {
                kind,
                annotation,
                status,
            });
        }

        WorkflowReport {
            workflow: workflow.id.clone(),
            class: workflow.class.clone(),
            version: workflow.version().to_string(),
            declared: resolution.declared,
            resolve_issues: resolution.issues,
            setup_failures,
            outcomes,
        }
    }
}
