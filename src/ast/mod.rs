//! AST Module - parsed CWL documents
//!
//! Contains the Rust types read from YAML documents:
//! - `workflow`: Workflow, InputParameter
//! - `document`: WorkflowDocument and the document/inputs loaders
//!
//! These types represent the "what" - static structure parsed from YAML.
//! For validation, see the `runtime` module.

mod document;
mod workflow;

// Re-export all public types
pub use document::{load_document, load_inputs, parse_document, parse_inputs, WorkflowDocument};
pub use workflow::{short_name, InputParameter, Workflow};
