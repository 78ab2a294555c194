//! CQL2 JSON encoding decoder

use geo::Geometry;
use serde_json::{Map, Value};

use super::spatial::{bbox_from_value, geometry_from_value};
use super::{CmpOp, Expr, FilterError, Instant, SpatialOp, MAX_NESTING};

/// Decode a CQL2 JSON filter
pub fn parse_json(value: &Value) -> Result<Expr, FilterError> {
    decode(value, 1)
}

/// `depth` counts the expression objects enclosing `value`, itself included
fn decode(value: &Value, depth: usize) -> Result<Expr, FilterError> {
    if depth > MAX_NESTING {
        return Err(FilterError::Json(format!(
            "filter nests deeper than {} levels",
            MAX_NESTING
        )));
    }
    match value {
        Value::Object(map) => parse_object(map, depth),
        Value::Array(items) => Ok(Expr::Literal(Value::Array(items.clone()))),
        scalar => Ok(Expr::Literal(scalar.clone())),
    }
}

fn parse_object(map: &Map<String, Value>, depth: usize) -> Result<Expr, FilterError> {
    if let Some(op) = map.get("op") {
        let op = op
            .as_str()
            .ok_or_else(|| FilterError::Json(format!("'op' must be a string, got {}", op)))?;
        let args: &[Value] = match map.get("args") {
            Some(Value::Array(args)) => args.as_slice(),
            Some(other) => {
                return Err(FilterError::Json(format!(
                    "'args' of '{}' must be a list, got {}",
                    op, other
                )))
            }
            None => &[],
        };
        return parse_op(op, args, depth);
    }

    if let Some(property) = map.get("property") {
        return property
            .as_str()
            .map(|name| Expr::Property(name.to_string()))
            .ok_or_else(|| {
                FilterError::Json(format!("property name must be a string, got {}", property))
            });
    }

    for key in ["timestamp", "date"] {
        if let Some(instant) = map.get(key) {
            return match instant {
                Value::String(text) => {
                    let parsed = if key == "date" {
                        Instant::date(text)
                    } else {
                        Instant::timestamp(text)
                    };
                    parsed.map(Expr::Instant).map_err(|e| {
                        FilterError::Json(format!("invalid {} '{}': {}", key, text, e))
                    })
                }
                other => Err(FilterError::Json(format!(
                    "'{}' must be a string, got {}",
                    key, other
                ))),
            };
        }
    }

    if let Some(function) = map.get("function") {
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::Json("function without a name".to_string()))?;
        let args = match function.get("args") {
            Some(Value::Array(args)) => args
                .iter()
                .map(|arg| decode(arg, depth + 1))
                .collect::<Result<_, _>>()?,
            _ => Vec::new(),
        };
        return Ok(Expr::Function {
            name: name.to_string(),
            args,
        });
    }

    if map.contains_key("type") {
        return geometry_from_value(&Value::Object(map.clone())).map(Expr::Geometry);
    }

    if let Some(bbox) = map.get("bbox") {
        return bbox_from_value(bbox)
            .map(|rect| Expr::Geometry(Geometry::Rect(rect)))
            .map_err(|e| FilterError::Json(e.to_string()));
    }

    if map.contains_key("interval") {
        return Err(FilterError::Json("intervals are not supported".to_string()));
    }

    Err(FilterError::Json(format!(
        "unrecognized expression {}",
        Value::Object(map.clone())
    )))
}

fn arity(op: &str, args: &[Value], expected: usize) -> Result<(), FilterError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(FilterError::Json(format!(
            "'{}' expects {} arguments, got {}",
            op,
            expected,
            args.len()
        )))
    }
}

fn parse_op(op: &str, args: &[Value], depth: usize) -> Result<Expr, FilterError> {
    let lowered = op.to_ascii_lowercase();
    let boxed = |value: &Value| decode(value, depth + 1).map(Box::new);
    let all = |values: &[Value]| {
        values
            .iter()
            .map(|value| decode(value, depth + 1))
            .collect::<Result<Vec<_>, _>>()
    };

    if let Some(cmp) = CmpOp::from_symbol(&lowered) {
        arity(op, args, 2)?;
        return Ok(Expr::Compare {
            op: cmp,
            left: boxed(&args[0])?,
            right: boxed(&args[1])?,
        });
    }

    if let Some(spatial) = SpatialOp::from_name(&lowered) {
        arity(op, args, 2)?;
        return Ok(Expr::Spatial {
            op: spatial,
            left: boxed(&args[0])?,
            right: boxed(&args[1])?,
        });
    }

    match lowered.as_str() {
        "and" | "or" => {
            if args.is_empty() {
                return Err(FilterError::Json(format!("'{}' needs arguments", op)));
            }
            let operands = all(args)?;
            Ok(if lowered == "and" {
                Expr::And(operands)
            } else {
                Expr::Or(operands)
            })
        }
        "not" => {
            arity(op, args, 1)?;
            Ok(Expr::Not(boxed(&args[0])?))
        }
        "like" => {
            arity(op, args, 2)?;
            Ok(Expr::Like {
                expr: boxed(&args[0])?,
                pattern: boxed(&args[1])?,
                negated: false,
            })
        }
        "between" => {
            // [value, low, high] or [value, [low, high]]
            let (low, high) = match args {
                [_, low, high] => (low, high),
                [_, Value::Array(range)] if range.len() == 2 => (&range[0], &range[1]),
                _ => {
                    return Err(FilterError::Json(format!(
                        "'between' expects a value and two bounds, got {} arguments",
                        args.len()
                    )))
                }
            };
            Ok(Expr::Between {
                expr: boxed(&args[0])?,
                low: boxed(low)?,
                high: boxed(high)?,
                negated: false,
            })
        }
        "in" => {
            arity(op, args, 2)?;
            let Value::Array(items) = &args[1] else {
                return Err(FilterError::Json(format!(
                    "second argument of 'in' must be a list, got {}",
                    args[1]
                )));
            };
            Ok(Expr::In {
                expr: boxed(&args[0])?,
                list: all(items.as_slice())?,
                negated: false,
            })
        }
        "isnull" => {
            arity(op, args, 1)?;
            Ok(Expr::IsNull {
                expr: boxed(&args[0])?,
                negated: false,
            })
        }
        _ => Ok(Expr::Function {
            name: op.to_string(),
            args: all(args)?,
        }),
    }
}
