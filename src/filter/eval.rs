//! Filter evaluation over an input mapping

use std::cmp::Ordering;

use geo::Geometry;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use super::spatial::{ensure_bbox, geometry_from_value, spatial_relation};
use super::{CmpOp, Expr, FilterError, Instant};

/// Intermediate evaluation value
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Value(Value),
    Geometry(Geometry<f64>),
    Instant(Instant),
}

impl Datum {
    fn is_null(&self) -> bool {
        matches!(self, Datum::Value(Value::Null))
    }

    fn describe(&self) -> String {
        match self {
            Datum::Value(value) => value.to_string(),
            Datum::Geometry(_) => "a geometry".to_string(),
            Datum::Instant(instant) => instant.to_string(),
        }
    }
}

/// Function callable from a filter (`ensure_bbox(aoi)`)
pub type FilterFunction = fn(&[Datum]) -> Result<Datum, FilterError>;

/// Evaluates parsed filters against input mappings
///
/// Function names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    functions: FxHashMap<String, FilterFunction>,
}

impl Evaluator {
    /// Evaluator without any function
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with the built-in function map (`ensure_bbox`)
    pub fn with_default_functions() -> Self {
        Self::new().with_function("ensure_bbox", ensure_bbox)
    }

    pub fn with_function(mut self, name: &str, function: FilterFunction) -> Self {
        self.functions.insert(name.to_ascii_lowercase(), function);
        self
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_lowercase())
    }

    /// Evaluate a filter as a predicate; non-boolean results are errors
    pub fn matches(&self, expr: &Expr, inputs: &Map<String, Value>) -> Result<bool, FilterError> {
        match self.evaluate(expr, inputs)? {
            Datum::Value(Value::Bool(result)) => Ok(result),
            other => Err(FilterError::Evaluation(format!(
                "filter evaluated to {}, expected a boolean",
                other.describe()
            ))),
        }
    }

    pub fn evaluate(&self, expr: &Expr, inputs: &Map<String, Value>) -> Result<Datum, FilterError> {
        match expr {
            Expr::Literal(value) => Ok(Datum::Value(value.clone())),
            Expr::Property(name) => Ok(Datum::Value(lookup(inputs, name))),
            Expr::Geometry(geometry) => Ok(Datum::Geometry(geometry.clone())),
            Expr::Instant(instant) => Ok(Datum::Instant(*instant)),
            Expr::Not(inner) => Ok(boolean(!self.truth(inner, inputs)?)),
            Expr::And(operands) => {
                for operand in operands {
                    if !self.truth(operand, inputs)? {
                        return Ok(boolean(false));
                    }
                }
                Ok(boolean(true))
            }
            Expr::Or(operands) => {
                for operand in operands {
                    if self.truth(operand, inputs)? {
                        return Ok(boolean(true));
                    }
                }
                Ok(boolean(false))
            }
            Expr::Compare { op, left, right } => {
                let left = self.evaluate(left, inputs)?;
                let right = self.evaluate(right, inputs)?;
                compare(*op, &left, &right).map(boolean)
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let value = self.evaluate(expr, inputs)?;
                let pattern = self.evaluate(pattern, inputs)?;
                match (value, pattern) {
                    (Datum::Value(Value::Null), _) | (_, Datum::Value(Value::Null)) => {
                        Ok(boolean(false))
                    }
                    (Datum::Value(Value::String(text)), Datum::Value(Value::String(pattern))) => {
                        Ok(boolean(like_regex(&pattern)?.is_match(&text) != *negated))
                    }
                    (value, pattern) => Err(FilterError::Evaluation(format!(
                        "LIKE needs string operands, got {} and {}",
                        value.describe(),
                        pattern.describe()
                    ))),
                }
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let value = self.evaluate(expr, inputs)?;
                let low = self.evaluate(low, inputs)?;
                let high = self.evaluate(high, inputs)?;
                if value.is_null() || low.is_null() || high.is_null() {
                    return Ok(boolean(false));
                }
                let inside =
                    compare(CmpOp::Ge, &value, &low)? && compare(CmpOp::Le, &value, &high)?;
                Ok(boolean(inside != *negated))
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                let value = self.evaluate(expr, inputs)?;
                if value.is_null() {
                    return Ok(boolean(false));
                }
                for item in list {
                    let item = self.evaluate(item, inputs)?;
                    if compare(CmpOp::Eq, &value, &item)? {
                        return Ok(boolean(!*negated));
                    }
                }
                Ok(boolean(*negated))
            }
            Expr::IsNull { expr, negated } => {
                let value = self.evaluate(expr, inputs)?;
                Ok(boolean(value.is_null() != *negated))
            }
            Expr::Spatial { op, left, right } => {
                let left = self.evaluate(left, inputs)?;
                let right = self.evaluate(right, inputs)?;
                if left.is_null() || right.is_null() {
                    return Ok(boolean(false));
                }
                let left = as_geometry(left)?;
                let right = as_geometry(right)?;
                Ok(boolean(spatial_relation(*op, &left, &right)))
            }
            Expr::Function { name, args } => {
                let function = self
                    .functions
                    .get(&name.to_ascii_lowercase())
                    .ok_or_else(|| FilterError::UnknownFunction(name.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, inputs))
                    .collect::<Result<Vec<_>, _>>()?;
                function(&args)
            }
        }
    }

    fn truth(&self, expr: &Expr, inputs: &Map<String, Value>) -> Result<bool, FilterError> {
        match self.evaluate(expr, inputs)? {
            Datum::Value(Value::Bool(b)) => Ok(b),
            other => Err(FilterError::Evaluation(format!(
                "expected a boolean operand, got {}",
                other.describe()
            ))),
        }
    }
}

fn boolean(value: bool) -> Datum {
    Datum::Value(Value::Bool(value))
}

/// Exact key first, then a dotted path through nested mappings
fn lookup(inputs: &Map<String, Value>, name: &str) -> Value {
    if let Some(value) = inputs.get(name) {
        return value.clone();
    }

    let mut parts = name.split('.');
    let mut current = parts.next().and_then(|first| inputs.get(first));
    for part in parts {
        current = current.and_then(|value| match value {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        });
    }
    current.cloned().unwrap_or(Value::Null)
}

fn as_geometry(datum: Datum) -> Result<Geometry<f64>, FilterError> {
    match datum {
        Datum::Geometry(geometry) => Ok(geometry),
        Datum::Value(value) => geometry_from_value(&value),
        Datum::Instant(instant) => Err(FilterError::Geometry(format!(
            "expected a geometry, got {instant}"
        ))),
    }
}

fn compare(op: CmpOp, left: &Datum, right: &Datum) -> Result<bool, FilterError> {
    match (left, right) {
        (Datum::Value(Value::Null), _) | (_, Datum::Value(Value::Null)) => Ok(false),
        (Datum::Value(a), Datum::Value(b)) => compare_values(op, a, b),
        (Datum::Geometry(a), Datum::Geometry(b)) => match op {
            CmpOp::Eq => Ok(a == b),
            CmpOp::Ne => Ok(a != b),
            _ => Err(FilterError::Evaluation(format!(
                "geometries cannot be compared with '{}'",
                op.symbol()
            ))),
        },
        (Datum::Instant(a), Datum::Instant(b)) => Ok(holds(op, a.compare(b))),
        // input strings order as instants when they parse as one
        (Datum::Instant(a), Datum::Value(value)) => match Instant::coerce(value) {
            Some(b) => Ok(holds(op, a.compare(&b))),
            None => mismatched(op, left, right),
        },
        (Datum::Value(value), Datum::Instant(b)) => match Instant::coerce(value) {
            Some(a) => Ok(holds(op, a.compare(b))),
            None => mismatched(op, left, right),
        },
        _ => mismatched(op, left, right),
    }
}

/// Differently typed operands are never equal and cannot be ordered
fn mismatched(op: CmpOp, left: &Datum, right: &Datum) -> Result<bool, FilterError> {
    match op {
        CmpOp::Eq => Ok(false),
        CmpOp::Ne => Ok(true),
        _ => Err(FilterError::Evaluation(format!(
            "cannot compare {} {} {}",
            left.describe(),
            op.symbol(),
            right.describe()
        ))),
    }
}

fn holds(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    }
}

fn compare_values(op: CmpOp, a: &Value, b: &Value) -> Result<bool, FilterError> {
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    };

    match ordering {
        Some(ordering) => Ok(holds(op, ordering)),
        None => match op {
            CmpOp::Eq => Ok(a == b),
            CmpOp::Ne => Ok(a != b),
            _ => Err(FilterError::Evaluation(format!(
                "cannot compare {} {} {}",
                a,
                op.symbol(),
                b
            ))),
        },
    }
}

/// `%` matches any run, `_` one character, `\` escapes the next one
fn like_regex(pattern: &str) -> Result<Regex, FilterError> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    regex.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|e| FilterError::Evaluation(e.to_string()))
}
