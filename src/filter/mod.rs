//! CQL2 Filter Engine
//!
//! Parses CQL2 filters (text or JSON encoding) and evaluates them as
//! boolean predicates over an input mapping.
//!
//! - `text`: CQL2 text lexer + recursive descent parser
//! - `json`: CQL2 JSON decoder
//! - `eval`: evaluator with a pluggable function map
//! - `spatial`: geometry helpers (`ensure_bbox`, GeoJSON operands)
//! - `temporal`: `TIMESTAMP`/`DATE` instants and their ordering
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hintguard::filter::{parse_text, Evaluator};
//!
//! let expr = parse_text("S_INTERSECTS(ensure_bbox(aoi), BBOX(-120, 30, -110, 40))")?;
//! let evaluator = Evaluator::with_default_functions();
//! assert!(evaluator.matches(&expr, &inputs)?);
//! ```

mod eval;
mod json;
mod spatial;
mod temporal;
mod text;

use geo::Geometry;
use serde_json::Value;
use thiserror::Error;

pub use eval::{Datum, Evaluator, FilterFunction};
pub use json::parse_json;
pub use spatial::{bbox_from_value, ensure_bbox, geometry_from_value};
pub use temporal::Instant;
pub use text::parse_text;

/// Deepest expression nesting either parser accepts
///
/// Evaluation recurses once per level, so this also bounds the evaluator.
pub const MAX_NESTING: usize = 128;

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, boolean or null literal
    Literal(Value),
    /// Input property reference
    Property(String),
    /// Geometry literal (WKT, BBOX or GeoJSON)
    Geometry(Geometry<f64>),
    /// `TIMESTAMP(...)` or `DATE(...)` literal
    Instant(Instant),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Spatial {
        op: SpatialOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Spatial predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOp {
    Intersects,
    Disjoint,
    Contains,
    Within,
    Equals,
}

impl SpatialOp {
    /// Case-insensitive lookup (`S_INTERSECTS`, `s_intersects`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "s_intersects" => Some(Self::Intersects),
            "s_disjoint" => Some(Self::Disjoint),
            "s_contains" => Some(Self::Contains),
            "s_within" => Some(Self::Within),
            "s_equals" => Some(Self::Equals),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Intersects => "S_INTERSECTS",
            Self::Disjoint => "S_DISJOINT",
            Self::Contains => "S_CONTAINS",
            Self::Within => "S_WITHIN",
            Self::Equals => "S_EQUALS",
        }
    }
}

/// Filter parsing and evaluation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("invalid CQL2 JSON: {0}")]
    Json(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("{0}")]
    Evaluation(String),
}
