//! Shared types, error model, and configuration for Salescope.
//!
//! This crate is the foundation depended on by all other Salescope crates.
//! It provides:
//! - [`SalescopeError`] is the unified error type
//! - Report wire types ([`CompletenessReport`], [`SectionReport`], [`Issue`])
//! - Issue locators ([`FieldPath`])
//! - Configuration ([`AppConfig`], [`EvaluationOptions`], config loading)

pub mod config;
pub mod error;
pub mod path;
pub mod report;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EvaluationConfig, EvaluationOptions, ItemKeyPolicy, OutputConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SalescopeError};
pub use path::{FieldPath, PathSegment};
pub use report::{
    CompletenessReport, CrossComponentCheck, Issue, IssueKind, SectionKind, SectionReport,
    Severity,
};
