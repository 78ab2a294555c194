//! Test fixtures and helpers

use std::sync::Arc;

use hintguard::ast::{parse_document, Workflow};
use hintguard::validate::Inputs;
use serde_json::Value;

/// Workflow carrying one hint of each kind plus a foreign requirement
pub fn water_bodies_yaml() -> &'static str {
    r#"
cwlVersion: v1.2
$namespaces:
  eoap: https://eoap.ogc.org/
$graph:
  - class: Workflow
    id: water-bodies
    label: Water bodies detection
    inputs:
      aoi:
        type: string
        label: Area of interest
      epsg:
        type: int
        default: 4326
      bands:
        type: string[]
    hints:
      - class: NetworkAccess
        networkAccess: true
      - class: eoap:JSONSchemaHint
        json_schema:
          type: object
          required: [aoi, bands]
          properties:
            aoi:
              type: string
            bands:
              type: array
              minItems: 2
      - class: eoap:RegoPolicyHint
        module: |
          package workflow

          import rego.v1

          deny contains msg if {
              input.epsg != 4326
              msg := sprintf("EPSG %v is not supported", [input.epsg])
          }
        queries:
          - data.workflow.deny[x]
      - class: eoap:Cql2FilterHint
        queries:
          - id: aoi-in-sierra
            cql2: S_INTERSECTS(ensure_bbox(aoi), BBOX(-119.5, 38.0, -118.0, 39.0))
            message: Area of interest must intersect the Sierra Nevada tile
          - id: two-bands
            cql2:
              op: "="
              args: [{ property: bands_count }, 2]
            message: Exactly two bands are expected
    steps: []
    outputs: []
"#
}

/// Inputs satisfying every assertion of [`water_bodies_yaml`]
pub fn valid_inputs() -> Inputs {
    inputs(serde_json::json!({
        "aoi": "-118.985,38.432,-118.183,38.938",
        "epsg": 4326,
        "bands": ["green", "nir"],
        "bands_count": 2
    }))
}

pub fn inputs(value: Value) -> Inputs {
    match value {
        Value::Object(map) => map,
        other => panic!("inputs fixture must be a mapping, got {}", other),
    }
}

/// First process of the water bodies document
pub fn water_bodies() -> Arc<Workflow> {
    let document = parse_document(water_bodies_yaml()).expect("fixture parses");
    Arc::clone(&document.processes[0])
}

/// Workflow with the given hint records and no inputs
pub fn workflow_with_hints(hints: Vec<Value>) -> Arc<Workflow> {
    let workflow = hints
        .into_iter()
        .fold(Workflow::new("main", "Workflow"), Workflow::with_hint);
    Arc::new(workflow)
}
