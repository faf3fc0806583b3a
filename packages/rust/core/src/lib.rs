//! Pipeline plumbing for Quantifying.
//!
//! This crate wires the report updater to the rest of a pipeline run:
//! the repository path table, the explicit run context, git synchronization,
//! and the save-gated `README.md` update.

pub mod context;
pub mod git;
pub mod paths;
pub mod report;

pub use context::RunContext;
pub use paths::{PathEntry, PathTable};
pub use report::update_readme;
