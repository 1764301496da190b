//! Report aggregation.
//!
//! [`evaluate_completeness`] is the single entry point: it validates and
//! scores every section, runs the cross-component check once, and folds the
//! results into a [`CompletenessReport`]. The computation is pure; calling it
//! twice on the same payload yields identical reports.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, instrument};

use salescope_shared::{
    CompletenessReport, EvaluationOptions, Result, SalescopeError, SectionKind, SectionReport,
};

use crate::cross::check_cross_component;
use crate::fields::mean;
use crate::payload::PipelineSections;
use crate::schema::schema_for;
use crate::scoring::score_items;
use crate::validator::validate_list;

/// Evaluate `payload` with default options.
pub fn evaluate_completeness(payload: &Value) -> Result<CompletenessReport> {
    evaluate_completeness_with(payload, &EvaluationOptions::default())
}

/// Parse `input` as JSON and evaluate it.
pub fn evaluate_json(input: &str, options: &EvaluationOptions) -> Result<CompletenessReport> {
    let payload: Value =
        serde_json::from_str(input).map_err(|e| SalescopeError::parse(e.to_string()))?;
    evaluate_completeness_with(&payload, options)
}

/// Evaluate `payload`.
///
/// Fails only when the payload is not a JSON object. Every data-quality
/// defect is reported inside the returned report.
#[instrument(skip_all)]
pub fn evaluate_completeness_with(
    payload: &Value,
    options: &EvaluationOptions,
) -> Result<CompletenessReport> {
    let sections = PipelineSections::from_payload(payload)?;

    let mut reports = BTreeMap::new();
    for kind in SectionKind::REQUIRED {
        reports.insert(kind, section_report(kind, &sections, options));
    }
    if sections.has_sequences() {
        let kind = SectionKind::Sequences;
        reports.insert(kind, section_report(kind, &sections, options));
    }

    let cross_component = check_cross_component(&sections);

    let required_sections_present: BTreeMap<SectionKind, bool> = SectionKind::REQUIRED
        .iter()
        .map(|kind| (*kind, reports.get(kind).is_some_and(|r| r.present)))
        .collect();

    let required_ratios: Vec<f64> = SectionKind::REQUIRED
        .iter()
        .filter_map(|kind| reports.get(kind))
        .map(|r| r.completeness_ratio)
        .collect();
    let score_required_only = mean(&required_ratios);
    let score_including_optional = match reports.get(&SectionKind::Sequences) {
        Some(sequences) => {
            let mut all = required_ratios.clone();
            all.push(sequences.completeness_ratio);
            mean(&all)
        }
        None => score_required_only,
    };

    let is_complete = required_sections_present.values().all(|present| *present)
        && SectionKind::REQUIRED
            .iter()
            .filter_map(|kind| reports.get(kind))
            .all(|r| r.valid_items == r.total_items)
        && cross_component.passed;

    let report = CompletenessReport {
        is_complete,
        required_sections_present,
        sections: reports,
        cross_component,
        score_required_only,
        score_including_optional,
    };

    info!(
        is_complete,
        score_required_only,
        score_including_optional,
        issues = report.issue_count(),
        "pipeline evaluated"
    );

    Ok(report)
}

fn section_report(
    kind: SectionKind,
    sections: &PipelineSections<'_>,
    options: &EvaluationOptions,
) -> SectionReport {
    let items = sections.items(kind);
    let schema = schema_for(kind);

    let validation = validate_list(kind, items, schema, options);
    let scores = score_items(items, &schema.required_fields(), options.item_key);

    let mut errors = Vec::with_capacity(validation.errors.len() + 1);
    errors.extend(sections.shape_issue(kind).cloned());
    errors.extend(validation.errors);

    SectionReport {
        name: kind,
        required: kind.is_required(),
        present: !items.is_empty(),
        total_items: validation.total_items,
        valid_items: validation.valid_items,
        missing_required_errors: validation.missing_required_errors,
        completeness_ratio: validation.completeness_ratio,
        errors,
        required_fields: validation.required_fields,
        field_missing_counts: validation.field_missing_counts,
        blank_required_errors: validation.blank_required_errors,
        field_blank_counts: validation.field_blank_counts,
        item_field_scores: scores.item_scores,
        avg_field_score: scores.avg_score,
        field_completion_rates: scores.field_completion_rates,
    }
}
