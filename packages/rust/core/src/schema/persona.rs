//! Buyer personas: market-segment archetypes, not individual contacts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use salescope_shared::{FieldPath, IssueKind, SectionKind, Severity};

use super::{Entity, EntitySchema, FieldKind, FieldSpec, Finding, RecordRule};

/// Recommended upper bound for `persona_name`.
const PERSONA_NAME_MAX: usize = 60;
/// Recommended size range for `job_titles`.
const JOB_TITLES_RANGE: (usize, usize) = (10, 30);
/// Recommended size range for `excluded_job_titles`.
const EXCLUDED_TITLES_RANGE: (usize, usize) = (3, 10);

/// Persona tier classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PersonaTier {
    #[serde(rename = "tier_1")]
    Tier1,
    #[serde(rename = "tier_2")]
    Tier2,
    #[serde(rename = "tier_3")]
    Tier3,
}

impl PersonaTier {
    pub const ALL: [PersonaTier; 3] = [PersonaTier::Tier1, PersonaTier::Tier2, PersonaTier::Tier3];

    pub fn as_str(self) -> &'static str {
        match self {
            PersonaTier::Tier1 => "tier_1",
            PersonaTier::Tier2 => "tier_2",
            PersonaTier::Tier3 => "tier_3",
        }
    }
}

/// A buyer-company archetype.
///
/// `description` is expected to embed team size, deal size, sales cycle and
/// stakeholder count; those are only checked for presence, not parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerPersona {
    pub persona_name: String,
    pub tier: PersonaTier,
    pub job_titles: Vec<String>,
    pub excluded_job_titles: Vec<String>,
    pub industry: String,
    pub company_size_range: String,
    pub company_type: String,
    pub location: String,
    pub description: String,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec::required(
        name,
        FieldKind::Str {
            min_len: 0,
            max_len: None,
            trim: false,
        },
    )
}

pub static PERSONA_SCHEMA: EntitySchema = EntitySchema {
    entity: "BuyerPersona",
    fields: &[
        text("persona_name"),
        FieldSpec::required("tier", FieldKind::Choice(&["tier_1", "tier_2", "tier_3"])),
        FieldSpec::required("job_titles", FieldKind::StrList),
        FieldSpec::required("excluded_job_titles", FieldKind::StrList),
        text("industry"),
        text("company_size_range"),
        text("company_type"),
        text("location"),
        text("description"),
    ],
    rules: &[
        RecordRule {
            name: "persona_name_length",
            severity: Severity::Warning,
            check: persona_name_length,
        },
        RecordRule {
            name: "job_titles_count",
            severity: Severity::Warning,
            check: job_titles_count,
        },
        RecordRule {
            name: "excluded_job_titles_count",
            severity: Severity::Warning,
            check: excluded_job_titles_count,
        },
    ],
};

impl Entity for BuyerPersona {
    const SECTION: SectionKind = SectionKind::Personas;

    fn schema() -> &'static EntitySchema {
        &PERSONA_SCHEMA
    }
}

fn persona_name_length(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let Some(name) = record.get("persona_name").and_then(Value::as_str) else {
        return Vec::new();
    };
    let len = name.trim().chars().count();
    if len <= PERSONA_NAME_MAX {
        return Vec::new();
    }
    vec![Finding::new(
        at.join("persona_name"),
        IssueKind::TooLong,
        format!("persona_name is {len} characters, recommended at most {PERSONA_NAME_MAX}"),
    )]
}

fn job_titles_count(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    list_size_advice(record, at, "job_titles", JOB_TITLES_RANGE)
}

fn excluded_job_titles_count(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    list_size_advice(record, at, "excluded_job_titles", EXCLUDED_TITLES_RANGE)
}

/// Non-empty lists outside the recommended size range. Empty lists are
/// already reported as blank.
fn list_size_advice(
    record: &Map<String, Value>,
    at: &FieldPath,
    field: &str,
    (lo, hi): (usize, usize),
) -> Vec<Finding> {
    let Some(items) = record.get(field).and_then(Value::as_array) else {
        return Vec::new();
    };
    if items.is_empty() || (lo..=hi).contains(&items.len()) {
        return Vec::new();
    }
    vec![Finding::new(
        at.join(field),
        IssueKind::BadCount,
        format!("{field} has {} entries, recommended {lo}-{hi}", items.len()),
    )]
}
