//! Runtime Module - validation runs
//!
//! Contains the runtime components:
//! - `orchestrator`: resolves hints, builds validators, runs them in order
//! - `outcome`: per-validator outcomes and the per-workflow report
//!
//! This module represents the "how" - running assertions against inputs.
//! For static structure, see the `ast` and `hint` modules.

mod orchestrator;
mod outcome;

// Re-export public types
pub use orchestrator::Orchestrator;
pub use outcome::{Outcome, OutcomeStatus, SetupFailure, WorkflowReport};
