//! Per-invocation run context.
//!
//! Built once at program start and passed explicitly to every operation.

use quantifying_shared::{Quarter, RunConfig};

use crate::paths::PathTable;

/// Everything an operation needs to know about the current run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Save/git gates.
    pub config: RunConfig,
    /// Reporting period the run writes into.
    pub quarter: Quarter,
    /// Resolved repository paths.
    pub paths: PathTable,
}

impl RunContext {
    pub fn new(config: RunConfig, quarter: Quarter, paths: PathTable) -> Self {
        Self {
            config,
            quarter,
            paths,
        }
    }

    /// Same context with git operations switched off for the rest of the run.
    pub fn with_git_disabled(mut self) -> Self {
        self.config.enable_git = false;
        self
    }
}
