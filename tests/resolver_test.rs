//! Hint resolution tests
//!
//! Covers resolution from parsed documents: order preservation, namespace
//! handling, malformed records, and declaration round-trips.

mod common;

use std::sync::Arc;

use common::fixtures::*;
use hintguard::ast::{parse_document, Workflow};
use hintguard::convert::CwlTypeConverter;
use hintguard::hint::{Hint, HintKind, HintRegistry, Namespace};
use hintguard::resolve_hints;
use pretty_assertions::assert_eq;
use serde_json::json;

// ═══════════════════════════════════════════════════════════════
// ORDER AND FILTERING
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_document_hints_resolve_in_declaration_order() {
    let hints = resolve_hints(&water_bodies());
    let kinds: Vec<HintKind> = hints.iter().map(Hint::kind).collect();
    assert_eq!(
        kinds,
        vec![HintKind::Schema, HintKind::Policy, HintKind::Filter]
    );
}

#[test]
fn test_repeated_kinds_keep_their_positions() {
    let wf = workflow_with_hints(vec![
        json!({ "class": "eoap:Cql2FilterHint", "queries": [] }),
        json!({ "class": "eoap:JSONSchemaHint", "json_schema": { "type": "object" } }),
        json!({ "class": "eoap:Cql2FilterHint", "queries": [] }),
    ]);
    let kinds: Vec<HintKind> = resolve_hints(&wf).iter().map(Hint::kind).collect();
    assert_eq!(
        kinds,
        vec![HintKind::Filter, HintKind::Schema, HintKind::Filter]
    );
}

#[test]
fn test_map_form_hints_keep_document_order() {
    let document = parse_document(
        r#"
cwlVersion: v1.2
class: CommandLineTool
id: crop
inputs:
  zoom: int
  aoi: string
hints:
  eoap:RegoPolicyHint:
    module: |
      package workflow
    queries: []
  eoap:Cql2FilterHint:
    queries: []
  eoap:JSONSchemaHint:
    json_schema:
      type: object
"#,
    )
    .unwrap();
    let process = &document.processes[0];
    let ids: Vec<&str> = process.inputs.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["zoom", "aoi"]);

    let kinds: Vec<HintKind> = resolve_hints(process).iter().map(Hint::kind).collect();
    assert_eq!(
        kinds,
        vec![HintKind::Policy, HintKind::Filter, HintKind::Schema]
    );
}

#[test]
fn test_malformed_records_are_dropped_with_issues() {
    let wf = workflow_with_hints(vec![
        json!({ "class": "eoap:RegoPolicyHint", "queries": ["data.workflow.deny[x]"] }),
        json!({ "class": "eoap:UnheardOfHint" }),
        json!({ "class": "eoap:JSONSchemaHint", "json_schema": { "type": "object" } }),
        json!({
            "class": "eoap:Cql2FilterHint",
            "queries": [
                { "id": "q1", "cql2": "a = 1", "message": "a" },
                { "id": "q1", "cql2": "b = 1", "message": "b" }
            ]
        }),
    ]);

    let resolution = HintRegistry::default().resolve(&wf);
    assert_eq!(resolution.declared, 4);
    assert_eq!(resolution.hints.len(), 1);
    assert_eq!(resolution.hints[0].kind(), HintKind::Schema);

    let codes: Vec<(usize, &str)> = resolution
        .issues
        .iter()
        .map(|issue| (issue.index, issue.error.code()))
        .collect();
    assert_eq!(codes, vec![(0, "HG-010"), (1, "HG-011"), (3, "HG-012")]);
}

#[test]
fn test_expanded_class_iri_uses_document_namespaces() {
    let document = parse_document(
        r#"
cwlVersion: v1.2
$namespaces:
  eoap: https://eoap.ogc.org/
class: CommandLineTool
id: crop
inputs:
  aoi: string
hints:
  https://eoap.ogc.org/JSONSchemaHint:
    json_schema:
      type: object
"#,
    )
    .unwrap();
    let hints = resolve_hints(&document.processes[0]);
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].annotation(), "eoap:JSONSchemaHint");
}

#[test]
fn test_custom_prefix_ignores_default_namespace() {
    let wf = workflow_with_hints(vec![
        json!({ "class": "eoap:JSONSchemaHint", "json_schema": true }),
        json!({ "class": "assert:JSONSchemaHint", "json_schema": true }),
    ]);
    let registry = HintRegistry::with_builtin(Namespace::new("assert"));
    let resolution = registry.resolve(&wf);
    assert_eq!(resolution.hints.len(), 1);
    assert_eq!(resolution.hints[0].annotation(), "assert:JSONSchemaHint");
    assert!(resolution.issues.is_empty());
}

// ═══════════════════════════════════════════════════════════════
// DECLARATION ROUND-TRIP
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_declarations_resolve_back_to_equal_hints() {
    let original = resolve_hints(&water_bodies());
    let declarations = original
        .iter()
        .map(|hint| hint.to_declaration(&CwlTypeConverter))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let reparsed = resolve_hints(&workflow_with_hints(declarations));
    assert_eq!(reparsed, original);
}

#[test]
fn test_derived_schema_declaration_is_literal() {
    let wf = Arc::new(
        Workflow::new("main", "Workflow")
            .with_input("aoi", json!("string"))
            .with_input("epsg", json!("int?"))
            .with_hint(json!({ "class": "eoap:JSONSchemaHint" })),
    );
    let hint = &resolve_hints(&wf)[0];
    let declaration = hint.to_declaration(&CwlTypeConverter).unwrap();
    assert_eq!(declaration["json_schema"]["required"], json!(["aoi"]));

    let reparsed = resolve_hints(&workflow_with_hints(vec![declaration]));
    assert_eq!(
        reparsed[0].to_declaration(&CwlTypeConverter).unwrap(),
        hint.to_declaration(&CwlTypeConverter).unwrap()
    );
}
