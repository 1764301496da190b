//! Completeness report wire types.
//!
//! These structures are the JSON contract returned to callers: one
//! [`CompletenessReport`] per evaluated payload, with per-section detail and
//! the cross-component result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The four collections of a pipeline payload.
///
/// Declaration order is the serialization order of report maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Products,
    Personas,
    PersonasWithMappings,
    Sequences,
}

impl SectionKind {
    /// Every section, in payload order.
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Products,
        SectionKind::Personas,
        SectionKind::PersonasWithMappings,
        SectionKind::Sequences,
    ];

    /// Sections that must be present and fully valid for a complete pipeline.
    pub const REQUIRED: [SectionKind; 3] = [
        SectionKind::Products,
        SectionKind::Personas,
        SectionKind::PersonasWithMappings,
    ];

    /// Payload key for this section.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Products => "products",
            SectionKind::Personas => "personas",
            SectionKind::PersonasWithMappings => "personas_with_mappings",
            SectionKind::Sequences => "sequences",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, SectionKind::Sequences)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Machine-readable issue tag (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "missing")]
    Missing,
    #[serde(rename = "type_error.string")]
    NotString,
    #[serde(rename = "type_error.integer")]
    NotInteger,
    #[serde(rename = "type_error.list")]
    NotList,
    #[serde(rename = "type_error.object")]
    NotObject,
    #[serde(rename = "value_error.blank")]
    Blank,
    #[serde(rename = "value_error.too_short")]
    TooShort,
    #[serde(rename = "value_error.too_long")]
    TooLong,
    #[serde(rename = "value_error.range")]
    OutOfRange,
    #[serde(rename = "value_error.enum")]
    InvalidChoice,
    #[serde(rename = "value_error.count")]
    BadCount,
    #[serde(rename = "value_error.mismatch")]
    Mismatch,
    #[serde(rename = "value_error.sequence")]
    Sequence,
    #[serde(rename = "value_error.subject_line")]
    SubjectLine,
    #[serde(rename = "value_error.reference")]
    Reference,
    #[serde(rename = "value_error.duplicate")]
    Duplicate,
}

/// Whether an issue excludes its item from `valid_items`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Structural violation; the item is not valid.
    #[default]
    Error,
    /// Advisory; reported but the item still counts as valid.
    Warning,
}

/// One structural, blank, or cross-reference defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Where the defect is.
    pub path: FieldPath,
    /// Human-readable description.
    pub message: String,
    /// Stable machine-readable tag.
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Not part of the wire contract.
    #[serde(skip)]
    pub severity: Severity,
}

impl Issue {
    /// An issue that invalidates its item.
    pub fn error(path: FieldPath, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
            severity: Severity::Error,
        }
    }

    /// An advisory issue.
    pub fn warning(path: FieldPath, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
            severity: Severity::Warning,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-section validation and completeness detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub name: SectionKind,
    pub required: bool,
    /// True iff the section has at least one item.
    pub present: bool,
    pub total_items: usize,
    /// Items with no blocking issue and no blank required field.
    pub valid_items: usize,
    /// Missing-field violations across all items, nested fields included.
    pub missing_required_errors: usize,
    /// `valid_items / total_items`, 0.0 for an empty section.
    pub completeness_ratio: f64,
    /// Every issue in item order.
    pub errors: Vec<Issue>,
    pub required_fields: Vec<String>,
    /// Field → number of items missing it.
    pub field_missing_counts: BTreeMap<String, usize>,
    /// Number of items with at least one blank required field.
    pub blank_required_errors: usize,
    /// Field → number of items with it blank.
    pub field_blank_counts: BTreeMap<String, usize>,
    /// Item key → fractional field completeness.
    pub item_field_scores: BTreeMap<String, f64>,
    pub avg_field_score: f64,
    /// Field → fraction of items where it is present and non-blank.
    pub field_completion_rates: BTreeMap<String, f64>,
}

/// Result of the referential checks spanning several sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossComponentCheck {
    pub passed: bool,
    pub issues: Vec<Issue>,
}

/// The full completeness report for one pipeline payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// All required sections present, fully valid, and cross-references intact.
    pub is_complete: bool,
    pub required_sections_present: BTreeMap<SectionKind, bool>,
    pub sections: BTreeMap<SectionKind, SectionReport>,
    pub cross_component: CrossComponentCheck,
    /// Mean completeness ratio of the required sections.
    pub score_required_only: f64,
    /// Mean including `sequences` when the payload carries it.
    pub score_including_optional: f64,
}

impl CompletenessReport {
    pub fn section(&self, kind: SectionKind) -> Option<&SectionReport> {
        self.sections.get(&kind)
    }

    /// Total issues across every section and the cross-component check.
    pub fn issue_count(&self) -> usize {
        self.sections.values().map(|s| s.errors.len()).sum::<usize>()
            + self.cross_component.issues.len()
    }
}
