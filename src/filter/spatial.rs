//! Geometry helpers - bounding boxes, GeoJSON operands, spatial relations

use geo::{BoundingRect, Coord, Geometry, Intersects, Rect, Relate};
use serde_json::Value;

use super::eval::Datum;
use super::{FilterError, SpatialOp};

const GEOJSON_GEOMETRY_TYPES: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Build a rectangle from `[minx, miny, maxx, maxy]` or
/// `[minx, miny, minz, maxx, maxy, maxz]`
pub(super) fn rect_from_numbers(numbers: &[f64]) -> Result<Rect<f64>, FilterError> {
    if let Some(bad) = numbers.iter().find(|n| !n.is_finite()) {
        return Err(FilterError::Geometry(format!(
            "bounding box coordinate {} is not finite",
            bad
        )));
    }
    match *numbers {
        [min_x, min_y, max_x, max_y] | [min_x, min_y, _, max_x, max_y, _] => Ok(Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        )),
        _ => Err(FilterError::Geometry(format!(
            "a bounding box needs 4 or 6 numbers, got {}",
            numbers.len()
        ))),
    }
}

/// Read a bounding box from an input value
///
/// Accepts a mapping carrying a `bbox` entry, a comma-delimited string
/// (`"-118.98,33.3,-118.3,34.2"`) or a numeric sequence.
pub fn bbox_from_value(value: &Value) -> Result<Rect<f64>, FilterError> {
    match value {
        Value::Object(map) => match map.get("bbox") {
            Some(Value::Null) | None => Err(FilterError::Evaluation(format!(
                "input {} doesn't have a 'bbox' property",
                value
            ))),
            Some(bbox) => bbox_from_value(bbox),
        },
        Value::String(text) => {
            let numbers = text
                .split(',')
                .map(|part| part.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| {
                    FilterError::Evaluation(format!(
                        "'{}' is not a comma-delimited list of numbers",
                        text
                    ))
                })?;
            rect_from_numbers(&numbers)
        }
        Value::Array(items) => {
            let numbers = items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    FilterError::Evaluation(format!("{} is not a list of numbers", value))
                })?;
            rect_from_numbers(&numbers)
        }
        other => Err(FilterError::Evaluation(format!(
            "cannot build a bounding box from {}",
            other
        ))),
    }
}

/// `ensure_bbox(value)` filter function
///
/// Geometries collapse to their bounding rectangle; values go through
/// [`bbox_from_value`].
pub fn ensure_bbox(args: &[Datum]) -> Result<Datum, FilterError> {
    match args {
        [Datum::Geometry(geometry)] => geometry
            .bounding_rect()
            .map(|rect| Datum::Geometry(Geometry::Rect(rect)))
            .ok_or_else(|| FilterError::Geometry("empty geometry has no bounds".to_string())),
        [Datum::Value(value)] => {
            bbox_from_value(value).map(|rect| Datum::Geometry(Geometry::Rect(rect)))
        }
        _ => Err(FilterError::Evaluation(format!(
            "ensure_bbox expects exactly 1 argument, got {}",
            args.len()
        ))),
    }
}

/// Read a geometry from an input value
///
/// GeoJSON geometries and features are converted directly; any other
/// mapping must carry a `bbox`.
pub fn geometry_from_value(value: &Value) -> Result<Geometry<f64>, FilterError> {
    let Value::Object(map) = value else {
        return Err(FilterError::Geometry(format!(
            "{} is not a GeoJSON geometry",
            value
        )));
    };

    match map.get("type").and_then(Value::as_str) {
        Some("Feature") => match map.get("geometry") {
            Some(geometry) if !geometry.is_null() => geometry_from_value(geometry),
            _ => map
                .get("bbox")
                .map(|_| bbox_from_value(value).map(Geometry::Rect))
                .unwrap_or_else(|| {
                    Err(FilterError::Geometry("feature has no geometry".to_string()))
                }),
        },
        Some(kind) if GEOJSON_GEOMETRY_TYPES.contains(&kind) => {
            let geojson = geojson::Geometry::from_json_value(value.clone())
                .map_err(|e| FilterError::Geometry(e.to_string()))?;
            Geometry::<f64>::try_from(geojson).map_err(|e| FilterError::Geometry(e.to_string()))
        }
        _ if map.contains_key("bbox") => bbox_from_value(value).map(Geometry::Rect),
        _ => Err(FilterError::Geometry(format!(
            "{} is neither GeoJSON nor a mapping with a 'bbox'",
            value
        ))),
    }
}

/// Rectangles and triangles are related through their polygon form
fn relatable(geometry: &Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Rect(rect) => Geometry::Polygon(rect.to_polygon()),
        Geometry::Triangle(triangle) => Geometry::Polygon(triangle.to_polygon()),
        other => other.clone(),
    }
}

pub(super) fn spatial_relation(op: SpatialOp, left: &Geometry<f64>, right: &Geometry<f64>) -> bool {
    match op {
        SpatialOp::Intersects => left.intersects(right),
        SpatialOp::Disjoint => !left.intersects(right),
        SpatialOp::Contains => relatable(left).relate(&relatable(right)).is_contains(),
        SpatialOp::Within => relatable(left).relate(&relatable(right)).is_within(),
        SpatialOp::Equals => left == right || relatable(left) == relatable(right),
    }
}
