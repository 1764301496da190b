//! Pipeline completeness validation and scoring for Salescope.
//!
//! This crate validates the output of a sales-intelligence generation run
//! (products, buyer personas, pain-point mappings, outreach sequences) and
//! folds the result into a [`CompletenessReport`](salescope_shared::CompletenessReport).
//! The entry point is [`evaluate_completeness`].

pub mod assemble;
pub mod batch;
pub mod coverage;
pub mod cross;
pub mod evaluate;
pub mod fields;
pub mod outreach;
pub mod payload;
pub mod schema;
pub mod scoring;
pub mod validator;

pub use assemble::{RunPayload, load_run_dir, payload_digest};
pub use batch::{BatchSummary, ProgressReporter, RunSummary, SilentProgress, evaluate_runs};
pub use coverage::{PersonaCoverage, coverage_from_payload, persona_coverage};
pub use cross::check_cross_component;
pub use outreach::{OutreachMetrics, SequenceMetrics, outreach_from_payload, outreach_metrics};
pub use evaluate::{evaluate_completeness, evaluate_completeness_with, evaluate_json};
pub use payload::PipelineSections;
pub use scoring::{FieldScores, score_items};
pub use validator::{ListValidation, validate_list};
