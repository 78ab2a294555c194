//! HintGuard - workflow input validation against assertion hints
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML → Rust types (Workflow, WorkflowDocument)   │
//! │  hint/      Assertion hints (Hint, HintKind, HintRegistry)   │
//! │  problem    Problem reports (ProblemReport, ErrorDetail)     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Orchestration (Orchestrator, WorkflowReport)     │
//! │  validate/  Validators (schema, policy, filter)              │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  filter/    CQL2 parser + evaluator (geo, geojson)           │
//! │  convert    CWL input types → JSON Schema                    │
//! │  report     Text / JSON rendering                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Document and inputs loading → `Workflow` |
//! | [`hint`] | Hint kinds, resolution from raw records, validator factory |
//! | [`validate`] | `Validator` contract, JSON Schema / Rego / CQL2 validators |
//! | [`runtime`] | Resolve → build → run, with per-hint failure isolation |
//! | [`problem`] | Problem registry kinds and report model |
//! | [`filter`] | CQL2 text and JSON encodings, spatial helpers |
//! | [`convert`] | Derived schemas for hints without `json_schema` |
//! | [`report`] | Rendering of workflow reports |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - YAML → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod hint;
pub mod problem;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Validation logic
// ═══════════════════════════════════════════════════════════════
pub mod runtime;
pub mod validate;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Engines, conversion, rendering
// ═══════════════════════════════════════════════════════════════
pub mod convert;
pub mod filter;
pub mod report;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, HintGuardError, Result};

// Config types
pub use config::{HintGuardConfig, OutputFormat};

// Domain types
pub use ast::{load_document, load_inputs, Workflow, WorkflowDocument};
pub use hint::{resolve_hints, Hint, HintKind, HintRegistry, Namespace};
pub use problem::{ErrorDetail, ProblemKind, ProblemReport};

// Validation
pub use runtime::{Orchestrator, Outcome, OutcomeStatus, WorkflowReport};
pub use validate::{EngineError, Inputs, Validator};
