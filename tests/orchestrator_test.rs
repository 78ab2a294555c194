//! End-to-end validation tests
//!
//! Documents are parsed from YAML, validated through the [`Orchestrator`]
//! and checked through the resulting [`WorkflowReport`]s.

mod common;

use common::fixtures::*;
use hintguard::ast::parse_document;
use hintguard::hint::HintKind;
use hintguard::problem::ProblemKind;
use hintguard::runtime::{Orchestrator, OutcomeStatus, WorkflowReport};
use pretty_assertions::assert_eq;
use serde_json::json;

fn run(inputs: serde_json::Value) -> WorkflowReport {
    Orchestrator::default().validate_workflow(&water_bodies(), &common::fixtures::inputs(inputs))
}

// ═══════════════════════════════════════════════════════════════
// PASSING RUNS
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_valid_inputs_pass_every_assertion() {
    let report = Orchestrator::default().validate_workflow(&water_bodies(), &valid_inputs());

    assert_eq!(report.declared, 4);
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.is_passed()));
    assert!(report.is_clean());
    assert_eq!(
        report.results(),
        vec![
            (HintKind::Schema, None),
            (HintKind::Policy, None),
            (HintKind::Filter, None),
        ]
    );
}

#[test]
fn test_workflow_without_hints_has_no_outcomes() {
    let document = parse_document(
        r#"
class: CommandLineTool
id: echo
inputs:
  message: string
"#,
    )
    .unwrap();
    let reports = Orchestrator::default().validate_document(&document, &valid_inputs());
    assert_eq!(reports.len(), 1);
    assert!(reports[0].outcomes.is_empty());
    assert_eq!(reports[0].declared, 0);
    assert!(reports[0].is_clean());
}

// ═══════════════════════════════════════════════════════════════
// VIOLATIONS
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_missing_required_input_is_reported_at_its_pointer() {
    let report = run(json!({
        "aoi": "-118.985,38.432,-118.183,38.938",
        "epsg": 4326,
        "bands_count": 2
    }));

    let schema = report.outcomes[0].report().unwrap();
    assert_eq!(schema.kind(), Some(ProblemKind::BusinessRuleViolation));
    assert_eq!(schema.status, 422);
    assert_eq!(schema.errors_at("/bands").count(), 1);
    assert!(report.outcomes[1].is_passed());
    assert!(report.outcomes[2].is_passed());
}

#[test]
fn test_policy_rows_become_violations() {
    let mut inputs = valid_inputs();
    inputs.insert("epsg".to_string(), json!(32611));

    let report = Orchestrator::default().validate_workflow(&water_bodies(), &inputs);
    let policy = report.outcomes[1].report().unwrap();
    assert_eq!(policy.errors.len(), 1);
    assert_eq!(policy.errors[0].pointer_str(), "data.workflow.deny[x]");
    assert_eq!(policy.errors[0].detail, "EPSG 32611 is not supported");
}

#[test]
fn test_false_filter_reports_its_message() {
    let report = run(json!({
        "aoi": "10.0,45.0,11.0,46.0",
        "epsg": 4326,
        "bands": ["green", "nir"],
        "bands_count": 3
    }));

    let filter = report.outcomes[2].report().unwrap();
    let details: Vec<(&str, &str)> = filter
        .errors
        .iter()
        .map(|e| (e.pointer_str(), e.detail.as_str()))
        .collect();
    assert_eq!(
        details,
        vec![
            (
                "aoi-in-sierra",
                "Area of interest must intersect the Sierra Nevada tile"
            ),
            ("two-bands", "Exactly two bands are expected"),
        ]
    );
}

#[test]
fn test_geometry_input_intersects_area() {
    let wf = workflow_with_hints(vec![json!({
        "class": "eoap:Cql2FilterHint",
        "queries": [{
            "id": "q1",
            "cql2": "S_INTERSECTS(aoi, POLYGON((0 0, 10 0, 10 10, 0 10, 0 0)))",
            "message": "out of area"
        }]
    })]);
    let orchestrator = Orchestrator::default();

    let inside = orchestrator.validate_workflow(
        &wf,
        &inputs(json!({ "aoi": { "type": "Point", "coordinates": [5.0, 5.0] } })),
    );
    assert!(inside.is_clean());

    let outside = orchestrator.validate_workflow(
        &wf,
        &inputs(json!({ "aoi": { "type": "Point", "coordinates": [50.0, 5.0] } })),
    );
    let report = outside.outcomes[0].report().unwrap();
    assert_eq!(report.errors[0].pointer_str(), "q1");
    assert_eq!(report.errors[0].detail, "out of area");
}

#[test]
fn test_unparseable_filter_is_a_violation_not_a_failure() {
    let wf = workflow_with_hints(vec![json!({
        "class": "eoap:Cql2FilterHint",
        "queries": [
            { "id": "broken", "cql2": "aoi = ", "message": "never shown" },
            { "id": "numeric", "cql2": 42, "message": "never shown" }
        ]
    })]);
    let report = Orchestrator::default().validate_workflow(&wf, &inputs(json!({})));

    let OutcomeStatus::Violated(problem) = &report.outcomes[0].status else {
        panic!("expected a violation, got {:?}", report.outcomes[0].status);
    };
    assert_eq!(problem.errors[0].code.as_deref(), Some("cql2-parse"));
    assert_eq!(problem.errors[1].code.as_deref(), Some("cql2-format"));
    assert!(!report.has_failures());
}

// ═══════════════════════════════════════════════════════════════
// FAILURE ISOLATION
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_invalid_policy_is_isolated_setup_failure() {
    let wf = workflow_with_hints(vec![
        json!({
            "class": "eoap:RegoPolicyHint",
            "module": "package workflow\n\ndeny contains msg if {",
            "queries": ["data.workflow.deny[x]"]
        }),
        json!({
            "class": "eoap:Cql2FilterHint",
            "queries": [{ "id": "q1", "cql2": "epsg = 4326", "message": "wrong epsg" }]
        }),
    ]);
    let report = Orchestrator::default().validate_workflow(&wf, &inputs(json!({ "epsg": 4326 })));

    assert_eq!(report.setup_failures.len(), 1);
    assert_eq!(report.setup_failures[0].kind, HintKind::Policy);
    assert_eq!(report.setup_failures[0].error.code(), "HG-021");
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].is_passed());
    assert!(!report.is_clean());
}

#[test]
fn test_engine_failure_becomes_server_error_report() {
    let wf = workflow_with_hints(vec![json!({
        "class": "eoap:Cql2FilterHint",
        "queries": [{ "id": "q1", "cql2": "epsg < 'high'", "message": "unused" }]
    })]);
    let report = Orchestrator::default().validate_workflow(&wf, &inputs(json!({ "epsg": 4326 })));

    assert!(report.has_failures());
    let problem = report.outcomes[0].report().unwrap();
    assert_eq!(problem.status, 500);
    assert_eq!(problem.errors[0].pointer_str(), "q1");
}

// ═══════════════════════════════════════════════════════════════
// DOCUMENTS
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_graph_processes_are_validated_independently() {
    let document = parse_document(
        r#"
cwlVersion: v1.2
$graph:
  - class: Workflow
    id: main
    inputs:
      epsg: int
    hints:
      eoap:JSONSchemaHint: {}
  - class: CommandLineTool
    id: step
    inputs:
      epsg: int
    hints:
      - class: eoap:Cql2FilterHint
        queries:
          - id: utm
            cql2: epsg BETWEEN 32601 AND 32660
            message: UTM north zones only
"#,
    )
    .unwrap();
    let reports =
        Orchestrator::default().validate_document(&document, &inputs(json!({ "epsg": 4326 })));

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].workflow, "main");
    assert!(reports[0].is_clean());
    assert_eq!(reports[1].class, "CommandLineTool");
    assert_eq!(reports[1].version, "v1.2");
    assert!(reports[1].has_violations());
}

#[test]
fn test_runs_are_idempotent() {
    let orchestrator = Orchestrator::default();
    let wf = water_bodies();
    let inputs = inputs(json!({ "epsg": 3857 }));

    let first = orchestrator.validate_workflow(&wf, &inputs);
    let second = orchestrator.validate_workflow(&wf, &inputs);
    assert_eq!(first.results(), second.results());
}
