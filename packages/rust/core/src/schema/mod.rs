//! Declarative entity schemas.
//!
//! Each entity is described by an [`EntitySchema`]: a list of [`FieldSpec`]s
//! (presence, type, and range constraints) plus [`RecordRule`]s for
//! cross-field invariants. [`EntitySchema::validate`] walks a raw JSON record
//! and reports every violation as an [`Issue`]; it never stops at the first.
//!
//! Severity is fixed per field constraint (always [`Severity::Error`]) and
//! per rule, so whether an issue excludes its item from `valid_items` never
//! depends on evaluation order.

pub mod mapping;
pub mod persona;
pub mod product;
pub mod sequence;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use salescope_shared::{FieldPath, Issue, IssueKind, SectionKind, Severity};

use crate::fields::is_blank;

pub use mapping::{MAPPING_SCHEMA, PAIN_POINT_SCHEMA, PainPointMapping, PersonaWithMappings};
pub use persona::{BuyerPersona, PERSONA_SCHEMA, PersonaTier};
pub use product::{PRODUCT_SCHEMA, Product};
pub use sequence::{OutreachSequence, SEQUENCE_SCHEMA, SequenceTouch, TOUCH_SCHEMA, TouchType};

// ---------------------------------------------------------------------------
// Schema model
// ---------------------------------------------------------------------------

/// Value constraint for one field.
#[derive(Debug)]
pub enum FieldKind {
    /// A string; length counted in characters, after trimming when `trim` is set.
    Str {
        min_len: usize,
        max_len: Option<usize>,
        trim: bool,
    },
    /// An integer. Integral floats and numeric strings are accepted.
    Int { min: Option<i64>, max: Option<i64> },
    /// A string drawn from a fixed set.
    Choice(&'static [&'static str]),
    /// A list whose elements are all strings.
    StrList,
    /// A list of nested records with a bounded size.
    ObjectList {
        item: &'static EntitySchema,
        min_items: usize,
        max_items: usize,
    },
}

/// One declared field of an entity.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A defect found by a [`RecordRule`], before severity is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub path: FieldPath,
    pub kind: IssueKind,
    pub message: String,
}

impl Finding {
    pub fn new(path: FieldPath, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

/// A cross-field invariant over a whole record.
///
/// Checks must tolerate malformed records: field-level problems are already
/// reported by the field specs, so a rule skips whatever it cannot read.
pub struct RecordRule {
    pub name: &'static str,
    pub severity: Severity,
    pub check: fn(&Map<String, Value>, &FieldPath) -> Vec<Finding>,
}

impl std::fmt::Debug for RecordRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordRule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish()
    }
}

/// Declarative definition of one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    pub entity: &'static str,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [RecordRule],
}

impl EntitySchema {
    /// Names of the required top-level fields, in declaration order.
    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }

    /// Validate one raw record located at `at`, returning every issue found.
    pub fn validate(&self, record: &Value, at: &FieldPath) -> Vec<Issue> {
        let mut issues = Vec::new();
        self.validate_into(record, at, &mut issues);
        issues
    }

    fn validate_into(&self, record: &Value, at: &FieldPath, issues: &mut Vec<Issue>) {
        let Some(obj) = record.as_object() else {
            issues.push(Issue::error(
                at.clone(),
                IssueKind::NotObject,
                format!("{} must be an object", self.entity),
            ));
            return;
        };

        for spec in self.fields {
            let path = at.join(spec.name);
            match obj.get(spec.name) {
                None => {
                    if spec.required {
                        issues.push(Issue::error(path, IssueKind::Missing, "Field required"));
                    }
                }
                Some(Value::Null) if !spec.required => {}
                Some(value) if spec.required && is_blank(value) => {
                    issues.push(Issue::error(
                        path,
                        IssueKind::Blank,
                        "Field is blank (required non-empty)",
                    ));
                }
                Some(value) => check_kind(&spec.kind, value, &path, issues),
            }
        }

        for rule in self.rules {
            for finding in (rule.check)(obj, at) {
                issues.push(Issue {
                    path: finding.path,
                    message: finding.message,
                    kind: finding.kind,
                    severity: rule.severity,
                });
            }
        }
    }

    /// Rewrite laxly-typed integer fields as JSON integers so typed decoding
    /// agrees with validation.
    fn normalize_ints(&self, record: &mut Value) {
        let Some(obj) = record.as_object_mut() else {
            return;
        };
        for spec in self.fields {
            let Some(value) = obj.get_mut(spec.name) else {
                continue;
            };
            match &spec.kind {
                FieldKind::Int { .. } => {
                    if let Some(n) = as_int(value) {
                        *value = Value::from(n);
                    }
                }
                FieldKind::ObjectList { item, .. } => {
                    if let Some(items) = value.as_array_mut() {
                        for nested in items {
                            item.normalize_ints(nested);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn check_kind(kind: &FieldKind, value: &Value, path: &FieldPath, issues: &mut Vec<Issue>) {
    match kind {
        FieldKind::Str {
            min_len,
            max_len,
            trim,
        } => {
            let Some(s) = value.as_str() else {
                issues.push(not_string(path));
                return;
            };
            let len = if *trim { s.trim() } else { s }.chars().count();
            if len < *min_len {
                issues.push(Issue::error(
                    path.clone(),
                    IssueKind::TooShort,
                    format!("String should have at least {min_len} characters, got {len}"),
                ));
            }
            if let Some(max) = *max_len {
                if len > max {
                    issues.push(Issue::error(
                        path.clone(),
                        IssueKind::TooLong,
                        format!("String should have at most {max} characters, got {len}"),
                    ));
                }
            }
        }
        FieldKind::Int { min, max } => {
            let Some(n) = as_int(value) else {
                issues.push(Issue::error(
                    path.clone(),
                    IssueKind::NotInteger,
                    "Input should be a valid integer",
                ));
                return;
            };
            if let Some(min) = *min {
                if n < min {
                    issues.push(Issue::error(
                        path.clone(),
                        IssueKind::OutOfRange,
                        format!("Input should be greater than or equal to {min}"),
                    ));
                }
            }
            if let Some(max) = *max {
                if n > max {
                    issues.push(Issue::error(
                        path.clone(),
                        IssueKind::OutOfRange,
                        format!("Input should be less than or equal to {max}"),
                    ));
                }
            }
        }
        FieldKind::Choice(options) => {
            let Some(s) = value.as_str() else {
                issues.push(not_string(path));
                return;
            };
            if !options.contains(&s) {
                let expected = options
                    .iter()
                    .map(|o| format!("'{o}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                issues.push(Issue::error(
                    path.clone(),
                    IssueKind::InvalidChoice,
                    format!("Input should be one of {expected}, got '{s}'"),
                ));
            }
        }
        FieldKind::StrList => {
            let Some(items) = value.as_array() else {
                issues.push(not_list(path));
                return;
            };
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    issues.push(not_string(&path.index(i)));
                }
            }
        }
        FieldKind::ObjectList {
            item,
            min_items,
            max_items,
        } => {
            let Some(items) = value.as_array() else {
                issues.push(not_list(path));
                return;
            };
            if items.len() < *min_items || items.len() > *max_items {
                issues.push(Issue::error(
                    path.clone(),
                    IssueKind::BadCount,
                    format!(
                        "List should have {min_items} to {max_items} items, got {}",
                        items.len()
                    ),
                ));
            }
            for (i, nested) in items.iter().enumerate() {
                item.validate_into(nested, &path.index(i), issues);
            }
        }
    }
}

fn not_string(path: &FieldPath) -> Issue {
    Issue::error(path.clone(), IssueKind::NotString, "Input should be a valid string")
}

fn not_list(path: &FieldPath) -> Issue {
    Issue::error(path.clone(), IssueKind::NotList, "Input should be a valid list")
}

/// Lax integer reading: JSON integers, integral floats (`5.0`) and numeric
/// strings (`"5"`). Fractional values and booleans are rejected.
pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Typed entities
// ---------------------------------------------------------------------------

/// A typed value object backed by an [`EntitySchema`].
pub trait Entity: DeserializeOwned {
    /// Payload section holding this entity.
    const SECTION: SectionKind;

    fn schema() -> &'static EntitySchema;

    /// Validate `record` and decode it when it has no blocking issue.
    ///
    /// Unknown keys are ignored.
    fn decode(record: &Value) -> Option<Self> {
        let issues = Self::schema().validate(record, &FieldPath::root());
        if issues.iter().any(Issue::is_blocking) {
            return None;
        }
        let mut normalized = record.clone();
        Self::schema().normalize_ints(&mut normalized);
        serde_json::from_value(normalized).ok()
    }
}

/// Schema for the entities stored in `section`.
pub fn schema_for(section: SectionKind) -> &'static EntitySchema {
    match section {
        SectionKind::Products => &PRODUCT_SCHEMA,
        SectionKind::Personas => &PERSONA_SCHEMA,
        SectionKind::PersonasWithMappings => &MAPPING_SCHEMA,
        SectionKind::Sequences => &SEQUENCE_SCHEMA,
    }
}
