//! Section-level list validation.
//!
//! Runs an [`EntitySchema`] over every item of one payload section and
//! aggregates the issues into counts. Missing fields (key absent) and blank
//! fields (key present, value empty) are tallied separately.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, instrument};

use salescope_shared::{EvaluationOptions, FieldPath, Issue, IssueKind, SectionKind};

use crate::fields::ratio;
use crate::schema::EntitySchema;

/// Statistics for one validated section.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValidation {
    pub total_items: usize,
    pub valid_items: usize,
    /// Every missing-field violation, nested fields included.
    pub missing_required_errors: usize,
    /// Items with at least one blank required field.
    pub blank_required_errors: usize,
    /// Field → items missing it. Nested keys use `[]` for indices.
    pub field_missing_counts: BTreeMap<String, usize>,
    /// Field → items with it blank.
    pub field_blank_counts: BTreeMap<String, usize>,
    pub completeness_ratio: f64,
    pub errors: Vec<Issue>,
    pub required_fields: Vec<String>,
}

/// Validate every item of `section` against `schema`.
///
/// Items may carry unknown keys; they are ignored. An item counts toward
/// `valid_items` only when it has no blocking issue. Warnings are dropped
/// entirely when `options.soft_checks` is off.
#[instrument(skip_all, fields(section = %section, items = items.len()))]
pub fn validate_list(
    section: SectionKind,
    items: &[Value],
    schema: &EntitySchema,
    options: &EvaluationOptions,
) -> ListValidation {
    let mut valid_items = 0;
    let mut missing_required_errors = 0;
    let mut blank_required_errors = 0;
    let mut field_missing_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut field_blank_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut errors = Vec::new();

    let section_path = FieldPath::field(section.as_str());

    for (idx, item) in items.iter().enumerate() {
        let item_path = section_path.index(idx);
        let mut issues = schema.validate(item, &item_path);
        if !options.soft_checks {
            issues.retain(Issue::is_blocking);
        }

        // Per-item sets: a field counts once per item however often it repeats.
        let mut missing_fields = BTreeSet::new();
        let mut blank_fields = BTreeSet::new();
        for issue in &issues {
            let key = issue.path.strip_prefix(2).generalized().to_string();
            match issue.kind {
                IssueKind::Missing => {
                    missing_required_errors += 1;
                    missing_fields.insert(key);
                }
                IssueKind::Blank => {
                    blank_fields.insert(key);
                }
                _ => {}
            }
        }
        for field in missing_fields {
            *field_missing_counts.entry(field).or_default() += 1;
        }
        if !blank_fields.is_empty() {
            blank_required_errors += 1;
        }
        for field in blank_fields {
            *field_blank_counts.entry(field).or_default() += 1;
        }

        if !issues.iter().any(Issue::is_blocking) {
            valid_items += 1;
        }
        errors.extend(issues);
    }

    let total_items = items.len();
    debug!(
        total_items,
        valid_items,
        missing_required_errors,
        blank_required_errors,
        issues = errors.len(),
        "section validated"
    );

    ListValidation {
        total_items,
        valid_items,
        missing_required_errors,
        blank_required_errors,
        field_missing_counts,
        field_blank_counts,
        completeness_ratio: ratio(valid_items, total_items),
        errors,
        required_fields: schema
            .required_fields()
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MAPPING_SCHEMA, PRODUCT_SCHEMA, SEQUENCE_SCHEMA};
    use serde_json::json;

    const DESCRIPTION: &str = "Customer service platform that routes, tracks and resolves support cases across channels.";

    fn run(section: SectionKind, items: &[Value], schema: &EntitySchema) -> ListValidation {
        validate_list(section, items, schema, &EvaluationOptions::default())
    }

    #[test]
    fn empty_list_has_zero_ratio() {
        let result = run(SectionKind::Products, &[], &PRODUCT_SCHEMA);
        assert_eq!(result.total_items, 0);
        assert_eq!(result.completeness_ratio, 0.0);
        assert!(result.errors.is_empty());
        assert_eq!(result.required_fields, vec!["product_name", "description"]);
    }

    #[test]
    fn missing_and_blank_are_tracked_separately() {
        let items = vec![
            json!({"description": DESCRIPTION}),
            json!({"product_name": "", "description": DESCRIPTION}),
            json!({"product_name": "Service Cloud", "description": DESCRIPTION}),
        ];
        let result = run(SectionKind::Products, &items, &PRODUCT_SCHEMA);

        assert_eq!(result.total_items, 3);
        assert_eq!(result.valid_items, 1);
        assert_eq!(result.missing_required_errors, 1);
        assert_eq!(result.field_missing_counts.get("product_name"), Some(&1));
        assert_eq!(result.blank_required_errors, 1);
        assert_eq!(result.field_blank_counts.get("product_name"), Some(&1));
        assert_eq!(result.completeness_ratio, 0.3333);

        let kinds: Vec<_> = result.errors.iter().map(|e| (e.path.to_string(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("products[0].product_name".to_string(), IssueKind::Missing),
                ("products[1].product_name".to_string(), IssueKind::Blank),
            ]
        );
    }

    #[test]
    fn blank_item_counts_once_with_several_blank_fields() {
        let items = vec![json!({"product_name": " ", "description": null})];
        let result = run(SectionKind::Products, &items, &PRODUCT_SCHEMA);
        assert_eq!(result.blank_required_errors, 1);
        assert_eq!(result.field_blank_counts.len(), 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.valid_items, 0);
    }

    #[test]
    fn nested_missing_fields_use_generalized_keys() {
        let mapping = json!({"pain_point": "Reps waste hours on manual CRM updates."});
        let items = vec![json!({"persona_name": "Ops Leaders", "mappings": [mapping.clone(), mapping.clone(), mapping]})];
        let result = run(SectionKind::PersonasWithMappings, &items, &MAPPING_SCHEMA);

        assert_eq!(result.missing_required_errors, 3);
        assert_eq!(result.field_missing_counts.get("mappings[].value_proposition"), Some(&1));
        assert_eq!(result.errors[0].path.to_string(), "personas_with_mappings[0].mappings[0].value_proposition");
    }

    #[test]
    fn non_object_items_are_invalid() {
        let items = vec![json!("Sales Cloud"), json!(null)];
        let result = run(SectionKind::Products, &items, &PRODUCT_SCHEMA);
        assert_eq!(result.valid_items, 0);
        assert_eq!(result.missing_required_errors, 0);
        assert!(result.errors.iter().all(|e| e.kind == IssueKind::NotObject));
    }

    #[test]
    fn warnings_do_not_invalidate_and_can_be_disabled() {
        let touches: Vec<Value> = (0..4)
            .map(|i| {
                json!({
                    "sort_order": i + 1,
                    "touch_type": "phone",
                    "timing_days": i * 4,
                    "objective": "Follow up on the discovery call",
                    "content_suggestion": "Reference the pipeline review and ask for a meeting.",
                })
            })
            .collect();
        let items = vec![json!({
            "name": "Ops Leader Call Sequence",
            "persona_name": "Ops Leaders",
            "objective": "Book a discovery meeting",
            "total_touches": 5,
            "duration_days": 12,
            "touches": touches,
        })];

        let with_soft = run(SectionKind::Sequences, &items, &SEQUENCE_SCHEMA);
        assert_eq!(with_soft.valid_items, 1);
        assert_eq!(with_soft.errors.len(), 1);
        assert_eq!(with_soft.errors[0].kind, IssueKind::Mismatch);

        let options = EvaluationOptions {
            soft_checks: false,
            ..EvaluationOptions::default()
        };
        let without = validate_list(SectionKind::Sequences, &items, &SEQUENCE_SCHEMA, &options);
        assert_eq!(without.valid_items, 1);
        assert!(without.errors.is_empty());
    }
}
