//! Shared types, error model, and configuration for parcorpus.
//!
//! This crate is the foundation depended on by the other parcorpus crates.
//! It provides:
//! - [`CorpusError`], the unified error type
//! - Domain types ([`ExamplePair`], [`BuildSummary`], [`AlignedSentence`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, CorpusConfig, config_dir, config_file_path, init_config,
    init_config_at, load_config, load_config_from,
};
pub use error::{CorpusError, Result};
pub use types::{AlignedSentence, BuildSummary, ExamplePair, OutputMeta};
