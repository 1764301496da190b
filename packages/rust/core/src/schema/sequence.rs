//! Multi-touch outreach sequences.
//!
//! Hard rules (the item is invalid): field constraints, `sort_order` values
//! form `1..=n`, and the first touch is on day 0.
//!
//! Soft rules (warnings only): `total_touches` agrees with the touch list,
//! touches are listed in `sort_order`, `timing_days` strictly increases,
//! `duration_days` ends on the last touch and sits in the 10-21 day window,
//! and `subject_line` matches the channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use salescope_shared::{FieldPath, IssueKind, SectionKind, Severity};

use super::{Entity, EntitySchema, FieldKind, FieldSpec, Finding, RecordRule, as_int};
use crate::fields::str_field;

/// Target window for `duration_days`.
const DURATION_TARGET: (i64, i64) = (10, 21);

/// Communication channel for one touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchType {
    Email,
    Linkedin,
    Phone,
    Video,
}

impl TouchType {
    pub fn as_str(self) -> &'static str {
        match self {
            TouchType::Email => "email",
            TouchType::Linkedin => "linkedin",
            TouchType::Phone => "phone",
            TouchType::Video => "video",
        }
    }

    /// Written channels carry a subject line; calls do not.
    pub fn expects_subject_line(self) -> bool {
        matches!(self, TouchType::Email | TouchType::Linkedin)
    }
}

/// One step of an outreach sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceTouch {
    pub sort_order: u32,
    pub touch_type: TouchType,
    /// Cumulative days since the first touch.
    pub timing_days: u32,
    pub objective: String,
    #[serde(default)]
    pub subject_line: Option<String>,
    pub content_suggestion: String,
    #[serde(default)]
    pub hints: Option<String>,
}

/// A full outreach sequence targeting one persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachSequence {
    pub name: String,
    pub persona_name: String,
    pub objective: String,
    pub total_touches: u32,
    pub duration_days: u32,
    pub touches: Vec<SequenceTouch>,
}

const fn min_text(name: &'static str, min_len: usize) -> FieldSpec {
    FieldSpec::required(
        name,
        FieldKind::Str {
            min_len,
            max_len: None,
            trim: false,
        },
    )
}

const fn optional_text(name: &'static str, max_len: usize) -> FieldSpec {
    FieldSpec::optional(
        name,
        FieldKind::Str {
            min_len: 0,
            max_len: Some(max_len),
            trim: false,
        },
    )
}

pub static TOUCH_SCHEMA: EntitySchema = EntitySchema {
    entity: "SequenceTouch",
    fields: &[
        FieldSpec::required(
            "sort_order",
            FieldKind::Int {
                min: Some(1),
                max: None,
            },
        ),
        FieldSpec::required(
            "touch_type",
            FieldKind::Choice(&["email", "linkedin", "phone", "video"]),
        ),
        FieldSpec::required(
            "timing_days",
            FieldKind::Int {
                min: Some(0),
                max: None,
            },
        ),
        min_text("objective", 10),
        optional_text("subject_line", 500),
        min_text("content_suggestion", 20),
        optional_text("hints", 500),
    ],
    rules: &[],
};

pub static SEQUENCE_SCHEMA: EntitySchema = EntitySchema {
    entity: "OutreachSequence",
    fields: &[
        min_text("name", 10),
        min_text("persona_name", 5),
        min_text("objective", 10),
        FieldSpec::required(
            "total_touches",
            FieldKind::Int {
                min: Some(4),
                max: Some(6),
            },
        ),
        FieldSpec::required(
            "duration_days",
            FieldKind::Int {
                min: Some(7),
                max: None,
            },
        ),
        FieldSpec::required(
            "touches",
            FieldKind::ObjectList {
                item: &TOUCH_SCHEMA,
                min_items: 4,
                max_items: 6,
            },
        ),
    ],
    rules: &[
        RecordRule {
            name: "sort_order_permutation",
            severity: Severity::Error,
            check: sort_order_permutation,
        },
        RecordRule {
            name: "first_touch_day_zero",
            severity: Severity::Error,
            check: first_touch_day_zero,
        },
        RecordRule {
            name: "total_touches_matches",
            severity: Severity::Warning,
            check: total_touches_matches,
        },
        RecordRule {
            name: "sort_order_in_list_order",
            severity: Severity::Warning,
            check: sort_order_in_list_order,
        },
        RecordRule {
            name: "timing_strictly_increasing",
            severity: Severity::Warning,
            check: timing_strictly_increasing,
        },
        RecordRule {
            name: "duration_matches_last_touch",
            severity: Severity::Warning,
            check: duration_matches_last_touch,
        },
        RecordRule {
            name: "duration_target_window",
            severity: Severity::Warning,
            check: duration_target_window,
        },
        RecordRule {
            name: "subject_line_matches_channel",
            severity: Severity::Warning,
            check: subject_line_matches_channel,
        },
    ],
};

impl Entity for OutreachSequence {
    const SECTION: SectionKind = SectionKind::Sequences;

    fn schema() -> &'static EntitySchema {
        &SEQUENCE_SCHEMA
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn touches(record: &Map<String, Value>) -> &[Value] {
    record
        .get("touches")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn touch_int(touch: &Value, field: &str) -> Option<i64> {
    touch.get(field).and_then(as_int)
}

/// Every touch's `sort_order`, or `None` if any is unreadable.
fn sort_orders(touches: &[Value]) -> Option<Vec<i64>> {
    touches.iter().map(|t| touch_int(t, "sort_order")).collect()
}

fn sort_order_permutation(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let touches = touches(record);
    if touches.is_empty() {
        return Vec::new();
    }
    let Some(mut orders) = sort_orders(touches) else {
        return Vec::new();
    };
    orders.sort_unstable();
    let expected: Vec<i64> = (1..=touches.len() as i64).collect();
    if orders == expected {
        return Vec::new();
    }
    vec![Finding::new(
        at.join("touches"),
        IssueKind::Sequence,
        format!("sort_order must be sequential: {expected:?}, got {orders:?}"),
    )]
}

fn first_touch_day_zero(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let Some(first) = touches(record).first() else {
        return Vec::new();
    };
    match touch_int(first, "timing_days") {
        Some(days) if days != 0 => vec![Finding::new(
            at.join("touches").index(0).join("timing_days"),
            IssueKind::Sequence,
            format!("First touch must have timing_days = 0, got {days}"),
        )],
        _ => Vec::new(),
    }
}

fn total_touches_matches(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let Some(declared) = record.get("total_touches").and_then(as_int) else {
        return Vec::new();
    };
    let actual = touches(record).len();
    if declared == actual as i64 {
        return Vec::new();
    }
    vec![Finding::new(
        at.join("total_touches"),
        IssueKind::Mismatch,
        format!("total_touches ({declared}) does not match touches length ({actual})"),
    )]
}

/// Flags the first touch whose `sort_order` is not one more than the previous.
fn sort_order_in_list_order(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let mut prev = 0;
    for (pos, touch) in touches(record).iter().enumerate() {
        let order = touch_int(touch, "sort_order").unwrap_or(0);
        if order != prev + 1 {
            return vec![Finding::new(
                at.join("touches").index(pos).join("sort_order"),
                IssueKind::Sequence,
                format!("sort_order must be sequential starting from 1: expected {}, got {order}", prev + 1),
            )];
        }
        prev = order;
    }
    Vec::new()
}

fn timing_strictly_increasing(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let timings: Vec<Option<i64>> = touches(record)
        .iter()
        .map(|t| touch_int(t, "timing_days"))
        .collect();
    for (pos, pair) in timings.windows(2).enumerate() {
        if let [Some(before), Some(after)] = pair {
            if after <= before {
                return vec![Finding::new(
                    at.join("touches").index(pos + 1).join("timing_days"),
                    IssueKind::Sequence,
                    format!("timing_days must increase across touches: {after} follows {before}"),
                )];
            }
        }
    }
    Vec::new()
}

fn duration_matches_last_touch(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let Some(duration) = record.get("duration_days").and_then(as_int) else {
        return Vec::new();
    };
    let Some(last) = touches(record).last().and_then(|t| touch_int(t, "timing_days")) else {
        return Vec::new();
    };
    if duration == last {
        return Vec::new();
    }
    vec![Finding::new(
        at.join("duration_days"),
        IssueKind::Mismatch,
        format!("duration_days ({duration}) does not match last touch timing_days ({last})"),
    )]
}

fn duration_target_window(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let (lo, hi) = DURATION_TARGET;
    match record.get("duration_days").and_then(as_int) {
        // Below 7 is already a hard range error.
        Some(days) if days >= 7 && !(lo..=hi).contains(&days) => vec![Finding::new(
            at.join("duration_days"),
            IssueKind::OutOfRange,
            format!("duration_days is {days}, target is {lo}-{hi}"),
        )],
        _ => Vec::new(),
    }
}

fn subject_line_matches_channel(record: &Map<String, Value>, at: &FieldPath) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (pos, touch) in touches(record).iter().enumerate() {
        let Some(obj) = touch.as_object() else {
            continue;
        };
        let Some(channel) = obj
            .get("touch_type")
            .cloned()
            .and_then(|v| serde_json::from_value::<TouchType>(v).ok())
        else {
            continue;
        };
        let has_subject = str_field(obj, "subject_line").is_some();
        let path = at.join("touches").index(pos).join("subject_line");
        if channel.expects_subject_line() && !has_subject {
            findings.push(Finding::new(
                path,
                IssueKind::SubjectLine,
                format!("subject_line is expected for {} touches", channel.as_str()),
            ));
        } else if !channel.expects_subject_line() && has_subject {
            findings.push(Finding::new(
                path,
                IssueKind::SubjectLine,
                format!("subject_line should be null for {} touches", channel.as_str()),
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use salescope_shared::Issue;
    use serde_json::json;

    fn touch(order: i64, kind: &str, days: i64) -> Value {
        let subject = if matches!(kind, "email" | "linkedin") {
            json!("Quick insight on your pipeline")
        } else {
            Value::Null
        };
        json!({
            "sort_order": order,
            "touch_type": kind,
            "timing_days": days,
            "objective": "Introduce the pipeline visibility pain point",
            "subject_line": subject,
            "content_suggestion": "Hi {first_name}, noticed your team is scaling pipeline operations.",
        })
    }

    fn sequence(touches: Vec<Value>) -> Value {
        let last = touches
            .last()
            .and_then(|t| t["timing_days"].as_i64())
            .unwrap_or(0);
        json!({
            "name": "Revenue Leader Outreach Sequence",
            "persona_name": "Mid-Market SaaS Revenue Leaders",
            "objective": "Secure a discovery meeting",
            "total_touches": touches.len(),
            "duration_days": last,
            "touches": touches,
        })
    }

    fn validate(value: &Value) -> Vec<Issue> {
        SEQUENCE_SCHEMA.validate(value, &FieldPath::field("sequences").index(0))
    }

    fn standard() -> Vec<Value> {
        vec![
            touch(1, "email", 0),
            touch(2, "linkedin", 3),
            touch(3, "phone", 7),
            touch(4, "email", 14),
        ]
    }

    #[test]
    fn well_formed_sequence_is_clean() {
        let issues = validate(&sequence(standard()));
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn duplicate_sort_order_flags_hard_and_soft() {
        let mut touches = standard();
        touches[2]["sort_order"] = json!(2);
        let issues = validate(&sequence(touches));

        let hard: Vec<_> = issues.iter().filter(|i| i.is_blocking()).collect();
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].path.to_string(), "sequences[0].touches");

        let soft: Vec<_> = issues
            .iter()
            .filter(|i| !i.is_blocking() && i.kind == IssueKind::Sequence)
            .collect();
        assert_eq!(soft.len(), 1);
        assert_eq!(soft[0].path.to_string(), "sequences[0].touches[2].sort_order");
    }

    #[test]
    fn first_touch_must_start_on_day_zero() {
        let mut touches = standard();
        touches[0]["timing_days"] = json!(1);
        let issues = validate(&sequence(touches));
        assert!(issues.iter().any(|i| {
            i.is_blocking() && i.path.to_string() == "sequences[0].touches[0].timing_days"
        }));
    }

    #[test]
    fn total_touches_mismatch_is_a_warning() {
        let mut seq = sequence(standard());
        seq["total_touches"] = json!(5);
        let issues = validate(&seq);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Mismatch);
        assert!(!issues[0].is_blocking());
    }

    #[test]
    fn timing_must_increase() {
        let mut touches = standard();
        touches[2]["timing_days"] = json!(3);
        let issues = validate(&sequence(touches));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path.to_string(), "sequences[0].touches[2].timing_days");
        assert!(!issues[0].is_blocking());
    }

    #[test]
    fn duration_checks_are_warnings() {
        let mut seq = sequence(standard());
        seq["duration_days"] = json!(30);
        let issues = validate(&seq);
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::Mismatch, IssueKind::OutOfRange]);
        assert!(issues.iter().all(|i| !i.is_blocking()));
    }

    #[test]
    fn subject_line_follows_channel() {
        let mut touches = standard();
        touches[0]["subject_line"] = Value::Null;
        touches[2]["subject_line"] = json!("Calling about your pipeline");
        let issues = validate(&sequence(touches));
        let paths: Vec<_> = issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "sequences[0].touches[0].subject_line",
                "sequences[0].touches[2].subject_line",
            ]
        );
        assert!(issues.iter().all(|i| i.kind == IssueKind::SubjectLine && !i.is_blocking()));
    }

    #[test]
    fn touch_count_outside_range_is_an_error() {
        let touches = vec![touch(1, "email", 0), touch(2, "phone", 3), touch(3, "email", 7)];
        let mut seq = sequence(touches);
        seq["duration_days"] = json!(10);
        seq["total_touches"] = json!(4);
        let issues = validate(&seq);
        assert!(issues.iter().any(|i| i.kind == IssueKind::BadCount && i.is_blocking()));
    }

    #[test]
    fn decodes_typed_sequence() {
        let decoded = OutreachSequence::decode(&sequence(standard())).expect("decode");
        assert_eq!(decoded.touches.len(), 4);
        assert_eq!(decoded.touches[2].touch_type, TouchType::Phone);
        assert!(decoded.touches[2].subject_line.is_none());
    }
}
