//! CQL2 filter tests
//!
//! Exercises the public filter API: both encodings, the function map and
//! the spatial helpers, against realistic workflow inputs.

mod common;

use common::fixtures::*;
use hintguard::filter::{parse_json, parse_text, Datum, Evaluator, FilterError};
use hintguard::hint::{Cql2Expression, FilterQuery};
use hintguard::validate::{FilterValidator, Validator};
use hintguard::HintKind;
use serde_json::{json, Value};

fn matches(cql2: &str, inputs: Value) -> bool {
    let expr = parse_text(cql2).unwrap();
    Evaluator::with_default_functions()
        .matches(&expr, &common::fixtures::inputs(inputs))
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════
// ENCODINGS
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_text_and_json_encodings_agree() {
    let pairs = [
        (
            "epsg = 4326 AND bands_count >= 2",
            json!({
                "op": "and",
                "args": [
                    { "op": "=", "args": [{ "property": "epsg" }, 4326] },
                    { "op": ">=", "args": [{ "property": "bands_count" }, 2] }
                ]
            }),
        ),
        (
            "S_INTERSECTS(ensure_bbox(aoi), BBOX(-119.5, 38.0, -118.0, 39.0))",
            json!({
                "op": "s_intersects",
                "args": [
                    { "op": "ensure_bbox", "args": [{ "property": "aoi" }] },
                    { "bbox": [-119.5, 38.0, -118.0, 39.0] }
                ]
            }),
        ),
        (
            "NOT (epsg IN (3857, 32611))",
            json!({
                "op": "not",
                "args": [{ "op": "in", "args": [{ "property": "epsg" }, [3857, 32611]] }]
            }),
        ),
    ];

    let evaluator = Evaluator::with_default_functions();
    let inputs = valid_inputs();
    for (text, encoded) in pairs {
        let from_text = evaluator.matches(&parse_text(text).unwrap(), &inputs).unwrap();
        let from_json = evaluator.matches(&parse_json(&encoded).unwrap(), &inputs).unwrap();
        assert_eq!(from_text, from_json, "{}", text);
        assert!(from_text, "{}", text);
    }
}

#[test]
fn test_text_keywords_are_case_insensitive() {
    assert!(matches(
        "epsg between 4000 and 5000 and name like 'water%'",
        json!({ "epsg": 4326, "name": "water-bodies" })
    ));
}

#[test]
fn test_syntax_error_reports_position() {
    let err = parse_text("epsg = 4326 AND").unwrap_err();
    assert!(matches!(err, FilterError::Syntax { .. }));
}

// ═══════════════════════════════════════════════════════════════
// PREDICATES
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_nested_property_paths() {
    let inputs = json!({ "stac": { "collection": "sentinel-2-l2a", "bands": ["B03", "B08"] } });
    assert!(matches("stac.collection LIKE 'sentinel-2%'", inputs.clone()));
    assert!(matches("stac.bands.1 = 'B08'", inputs));
}

#[test]
fn test_acquisition_window_uses_instants() {
    // same instant written with an offset; lexically it sorts after the bound
    let inputs = json!({ "start": "2024-01-01T01:00:00+02:00" });
    assert!(matches("start < TIMESTAMP('2024-01-01T00:00:00Z')", inputs.clone()));

    let encoded = json!({
        "op": "<",
        "args": [{ "property": "start" }, { "timestamp": "2024-01-01T00:00:00Z" }]
    });
    let expr = parse_json(&encoded).unwrap();
    assert!(Evaluator::with_default_functions()
        .matches(&expr, &common::fixtures::inputs(inputs))
        .unwrap());

    assert!(matches(
        "start BETWEEN DATE('2023-12-31') AND DATE('2024-01-01')",
        json!({ "start": "2023-12-31T23:00:00Z" })
    ));
}

#[test]
fn test_missing_inputs_are_null() {
    assert!(matches("cloud_cover IS NULL", json!({})));
    assert!(!matches("cloud_cover < 20", json!({})));
    assert!(!matches("cloud_cover BETWEEN 0 AND 20", json!({})));
}

#[test]
fn test_feature_input_within_polygon() {
    let inputs = json!({
        "aoi": {
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [-118.5, 38.5] }
        }
    });
    assert!(matches(
        "S_WITHIN(aoi, POLYGON((-120 37, -117 37, -117 40, -120 40, -120 37)))",
        inputs.clone()
    ));
    assert!(!matches(
        "S_DISJOINT(aoi, ENVELOPE(-120, -117, 40, 37))",
        inputs
    ));
}

// ═══════════════════════════════════════════════════════════════
// FUNCTIONS
// ═══════════════════════════════════════════════════════════════

fn band_count(args: &[Datum]) -> Result<Datum, FilterError> {
    match args {
        [Datum::Value(Value::Array(items))] => Ok(Datum::Value(json!(items.len()))),
        _ => Err(FilterError::Evaluation(
            "band_count expects a sequence".to_string(),
        )),
    }
}

#[test]
fn test_custom_function_in_validator() {
    let queries = vec![FilterQuery {
        id: "two-bands".to_string(),
        cql2: Cql2Expression::Text("BAND_COUNT(bands) = 2".to_string()),
        message: "Exactly two bands are expected".to_string(),
    }];
    let evaluator = Evaluator::with_default_functions().with_function("band_count", band_count);
    let validator = FilterValidator::with_evaluator(&queries, evaluator);

    assert!(validator.validate(&valid_inputs()).unwrap().is_none());

    let report = validator
        .validate(&inputs(json!({ "bands": ["red"] })))
        .unwrap()
        .unwrap();
    assert_eq!(report.errors[0].detail, "Exactly two bands are expected");
}

#[test]
fn test_unknown_function_is_engine_error() {
    let queries = vec![FilterQuery {
        id: "q1".to_string(),
        cql2: Cql2Expression::Text("band_count(bands) = 2".to_string()),
        message: "unused".to_string(),
    }];
    let err = FilterValidator::new(&queries)
        .validate(&valid_inputs())
        .unwrap_err();
    assert_eq!(err.kind, HintKind::Filter);
    assert_eq!(err.pointer, "q1");
}
