//! CQL2 filter validator

use serde_json::Value;

use crate::filter::{parse_json, parse_text, Evaluator, Expr};
use crate::hint::{Cql2Expression, FilterQuery, HintKind};
use crate::problem::{ErrorDetail, ProblemReport};

use super::{violations, EngineError, Inputs, Validator};

/// Error detail codes for queries that never reach evaluation
pub const CODE_PARSE: &str = "cql2-parse";
pub const CODE_FORMAT: &str = "cql2-format";

/// A query parsed once at build time
#[derive(Debug, Clone)]
struct CompiledQuery {
    id: String,
    message: String,
    /// Parse failures are kept and reported on every run
    expr: Result<Expr, ErrorDetail>,
}

/// Evaluates each named CQL2 query as a boolean predicate over the inputs
#[derive(Debug, Clone)]
pub struct FilterValidator {
    queries: Vec<CompiledQuery>,
    evaluator: Evaluator,
}

impl FilterValidator {
    /// Build with the default function map (`ensure_bbox`)
    pub fn new(queries: &[FilterQuery]) -> Self {
        Self::with_evaluator(queries, Evaluator::with_default_functions())
    }

    pub fn with_evaluator(queries: &[FilterQuery], evaluator: Evaluator) -> Self {
        let queries = queries
            .iter()
            .map(|query| CompiledQuery {
                id: query.id.clone(),
                message: query.message.clone(),
                expr: compile(query),
            })
            .collect();
        Self { queries, evaluator }
    }
}

fn compile(query: &FilterQuery) -> Result<Expr, ErrorDetail> {
    match &query.cql2 {
        Cql2Expression::Text(text) => parse_text(text).map_err(|e| {
            ErrorDetail::new(
                &query.id,
                format!(
                    "Filter does not look like a valid CQL2 Text encoded sentence: {}",
                    e
                ),
            )
            .with_code(CODE_PARSE)
        }),
        Cql2Expression::Json(map) => parse_json(&Value::Object(map.clone())).map_err(|e| {
            ErrorDetail::new(
                &query.id,
                format!(
                    "Filter does not look like a valid CQL2 JSON encoded structure: {}",
                    e
                ),
            )
            .with_code(CODE_PARSE)
        }),
        Cql2Expression::Unrecognized(value) => Err(ErrorDetail::new(
            &query.id,
            format!(
                "Filter is expressed in an unrecognizable format: {}",
                shape(value)
            ),
        )
        .with_code(CODE_FORMAT)),
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

impl Validator for FilterValidator {
    fn kind(&self) -> HintKind {
        HintKind::Filter
    }

    fn validate(&self, inputs: &Inputs) -> Result<Option<ProblemReport>, EngineError> {
        let mut errors = Vec::new();

        for query in &self.queries {
            let expr = match &query.expr {
                Ok(expr) => expr,
                Err(detail) => {
                    errors.push(detail.clone());
                    continue;
                }
            };

            let satisfied = self
                .evaluator
                .matches(expr, inputs)
                .map_err(|e| EngineError::new(HintKind::Filter, &query.id, e.to_string()))?;

            tracing::debug!(query = %query.id, satisfied, "Evaluated CQL2 query");

            if !satisfied {
                errors.push(ErrorDetail::new(&query.id, &query.message));
            }
        }

        Ok(violations(errors))
    }
}
