//! Shared types, error model, and configuration for Quantifying.
//!
//! This crate is the foundation depended on by all other Quantifying crates.
//! It provides:
//! - [`QuantifyingError`] — the unified error type
//! - Domain types ([`Quarter`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, RunConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{QuantifyingError, Result};
pub use types::Quarter;
