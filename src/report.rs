//! Report rendering - text for terminals, JSON for machines

use std::fmt::Write;

use colored::Colorize;
use serde_json::{json, Map, Value};

use crate::ast::WorkflowDocument;
use crate::config::OutputFormat;
use crate::convert::InputSchemaConverter;
use crate::error::Result;
use crate::hint::HintRegistry;
use crate::runtime::{Outcome, OutcomeStatus, WorkflowReport};

/// Render reports in the requested format
pub fn render(reports: &[WorkflowReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => render_json(reports),
    }
}

pub fn render_text(reports: &[WorkflowReport]) -> String {
    let mut out = String::new();

    for report in reports {
        let mark = if report.is_clean() {
            "✓".green()
        } else {
            "✗".red()
        };
        let _ = writeln!(
            out,
            "{} #{} {} ({})",
            mark,
            report.workflow.bold(),
            report.class,
            report.version
        );

        if report.outcomes.is_empty() && report.setup_failures.is_empty() {
            let _ = writeln!(out, "  {}", "no assertions to check".dimmed());
        }

        for outcome in &report.outcomes {
            write_outcome(&mut out, outcome);
        }

        for failure in &report.setup_failures {
            let _ = writeln!(
                out,
                "  {} {}: {}",
                "setup failed".red().bold(),
                failure.annotation,
                failure.error
            );
        }

        for issue in &report.resolve_issues {
            let _ = writeln!(
                out,
                "  {} #{} {}: {}",
                "dropped hint".yellow(),
                issue.index,
                issue.class,
                issue.error
            );
        }
    }

    out
}

fn write_outcome(out: &mut String, outcome: &Outcome) {
    let header = format!("{} ({})", outcome.kind, outcome.annotation);
    match &outcome.status {
        OutcomeStatus::Passed => {
            let _ = writeln!(out, "  {} {}", header, "passed".green());
        }
        OutcomeStatus::Violated(problem) => {
            let count = problem.errors.len();
            let noun = if count == 1 { "violation" } else { "violations" };
            let _ = writeln!(
                out,
                "  {} {}",
                header,
                format!("{} {}", count, noun).red()
            );
            for detail in &problem.errors {
                let _ = writeln!(out, "    [{}] {}", detail.pointer_str().cyan(), detail.detail);
            }
        }
        OutcomeStatus::Failed(error) => {
            let _ = writeln!(out, "  {} {}", header, "engine failure".red().bold());
            let _ = writeln!(out, "    [{}] {}", error.pointer.cyan(), error.message);
        }
    }
}

/// Machine-readable form, one object per workflow
pub fn render_json(reports: &[WorkflowReport]) -> Result<String> {
    let value = Value::Array(reports.iter().map(report_json).collect());
    Ok(serde_json::to_string_pretty(&value)?)
}

fn report_json(report: &WorkflowReport) -> Value {
    let outcomes: Vec<Value> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let status = match outcome.status {
                OutcomeStatus::Passed => "passed",
                OutcomeStatus::Violated(_) => "violated",
                OutcomeStatus::Failed(_) => "failed",
            };
            json!({
                "kind": outcome.kind,
                "profile": outcome.kind.profile(),
                "annotation": outcome.annotation,
                "status": status,
                "report": outcome.report(),
            })
        })
        .collect();

    let setup_failures: Vec<Value> = report
        .setup_failures
        .iter()
        .map(|failure| {
            json!({
                "kind": failure.kind,
                "annotation": failure.annotation,
                "code": failure.error.code(),
                "message": failure.error.to_string(),
            })
        })
        .collect();

    let resolve_issues: Vec<Value> = report
        .resolve_issues
        .iter()
        .map(|issue| {
            json!({
                "index": issue.index,
                "class": issue.class,
                "code": issue.error.code(),
                "message": issue.error.to_string(),
            })
        })
        .collect();

    json!({
        "workflow": report.workflow,
        "class": report.class,
        "version": report.version,
        "declared": report.declared,
        "valid": report.is_clean(),
        "outcomes": outcomes,
        "setup_failures": setup_failures,
        "resolve_issues": resolve_issues,
    })
}

/// Resolved hint declarations keyed by process id
///
/// A hint whose declaration cannot be built is logged and left out, so one
/// bad input type does not hide the other hints.
pub fn hint_declarations(
    document: &WorkflowDocument,
    registry: &HintRegistry,
    converter: &dyn InputSchemaConverter,
) -> Value {
    let mut declarations = Map::new();
    for process in &document.processes {
        let resolution = registry.resolve(process);
        let hints = resolution
            .hints
            .iter()
            .filter_map(|hint| match hint.to_declaration(converter) {
                Ok(declaration) => Some(declaration),
                Err(error) => {
                    tracing::error!(
                        workflow = %process.id,
                        annotation = %hint.annotation(),
                        code = error.code(),
                        error = %error,
                        "Skipping hint declaration"
                    );
                    None
                }
            })
            .collect();
        declarations.insert(process.id.clone(), Value::Array(hints));
    }
    Value::Object(declarations)
}
