// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! HintGuard Error Types with Error Codes
//!
//! Error code ranges:
//! - HG-000-009: Document and inputs loading
//! - HG-010-019: Hint declarations
//! - HG-020-029: Validator setup
//! - HG-030-039: Configuration
//! - HG-090-099: IO / serialization
//!
//! Business-rule violations are never errors: validators report them as
//! [`ProblemReport`](crate::problem::ProblemReport)s. Evaluation engine
//! crashes use their own type, [`EngineError`](crate::validate::EngineError).

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HintGuardError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for diagnostic codes and help text.
#[derive(Error, Debug, Diagnostic)]
pub enum HintGuardError {
    // ═══════════════════════════════════════════
    // DOCUMENT / INPUTS ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[HG-001] Failed to parse workflow document: {details}")]
    #[diagnostic(
        code(hintguard::document_parse),
        help("Check YAML syntax: indentation and quoting")
    )]
    DocumentParse { details: String },

    #[error("[HG-002] Document not found: {path}")]
    #[diagnostic(code(hintguard::document_not_found), help("Check the file path exists"))]
    DocumentNotFound { path: String },

    #[error("[HG-003] Invalid workflow document: {reason}")]
    #[diagnostic(
        code(hintguard::invalid_document),
        help("Each process needs an 'id' and a 'class'")
    )]
    InvalidDocument { reason: String },

    #[error("[HG-004] Invalid inputs: {reason}")]
    #[diagnostic(
        code(hintguard::invalid_inputs),
        help("Inputs must be a YAML/JSON mapping of input id to value")
    )]
    InvalidInputs { reason: String },

    // ═══════════════════════════════════════════
    // HINT DECLARATION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[HG-010] Invalid hint '{class}': {reason}")]
    InvalidHint { class: String, reason: String },

    #[error("[HG-011] Unknown hint kind '{class}'")]
    UnknownHintKind { class: String },

    #[error("[HG-012] Duplicate query id '{id}' in hint '{class}'")]
    DuplicateQueryId { class: String, id: String },

    // ═══════════════════════════════════════════
    // VALIDATOR SETUP ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[HG-020] Invalid JSON Schema: {reason}")]
    InvalidSchema { reason: String },

    #[error("[HG-021] Invalid Rego module: {reason}")]
    InvalidPolicy { reason: String },

    #[error("[HG-022] Cannot convert type of input '{input}': {reason}")]
    TypeConversion { input: String, reason: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[HG-030] Configuration error: {reason}")]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[HG-090] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[HG-091] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[HG-092] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl HintGuardError {
    /// Get the error code (e.g., "HG-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::DocumentParse { .. } => "HG-001",
            Self::DocumentNotFound { .. } => "HG-002",
            Self::InvalidDocument { .. } => "HG-003",
            Self::InvalidInputs { .. } => "HG-004",
            Self::InvalidHint { .. } => "HG-010",
            Self::UnknownHintKind { .. } => "HG-011",
            Self::DuplicateQueryId { .. } => "HG-012",
            Self::InvalidSchema { .. } => "HG-020",
            Self::InvalidPolicy { .. } => "HG-021",
            Self::TypeConversion { .. } => "HG-022",
            Self::ConfigError { .. } => "HG-030",
            Self::IoError(_) => "HG-090",
            Self::JsonError(_) => "HG-091",
            Self::YamlParse(_) => "HG-092",
        }
    }

    /// Setup errors come from a hint that resolved but cannot build its validator
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSchema { .. } | Self::InvalidPolicy { .. } | Self::TypeConversion { .. }
        )
    }
}

impl FixSuggestion for HintGuardError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            HintGuardError::DocumentParse { .. } => {
                Some("Check YAML syntax: indentation and quoting")
            }
            HintGuardError::DocumentNotFound { .. } => Some("Check the file path exists"),
            HintGuardError::InvalidDocument { .. } => {
                Some("Declare 'class' and 'id' on every process of the document")
            }
            HintGuardError::InvalidInputs { .. } => {
                Some("Write inputs as a mapping, e.g. 'aoi: 10,20,30,40'")
            }
            HintGuardError::InvalidHint { .. } => {
                Some("Check the hint fields: json_schema | module + queries | queries[id, cql2, message]")
            }
            HintGuardError::UnknownHintKind { .. } => {
                Some("Use one of JSONSchemaHint, RegoPolicyHint, Cql2FilterHint")
            }
            HintGuardError::DuplicateQueryId { .. } => Some("Give every CQL2 query a unique id"),
            HintGuardError::InvalidSchema { .. } => {
                Some("Check the json_schema against the JSON Schema specification")
            }
            HintGuardError::InvalidPolicy { .. } => {
                Some("Check the Rego module syntax and its package declaration")
            }
            HintGuardError::TypeConversion { .. } => {
                Some("Declare the input type with a supported CWL type, or provide json_schema explicitly")
            }
            HintGuardError::ConfigError { .. } => {
                Some("Check ~/.config/hintguard/config.toml for syntax errors")
            }
            HintGuardError::IoError(_) => Some("Check file path and permissions"),
            HintGuardError::JsonError(_) => Some("Check JSON syntax"),
            HintGuardError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
