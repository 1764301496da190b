//! Graded field completeness.
//!
//! A record can be structurally valid and still sparse, or invalid but nearly
//! complete. These scores measure how many required fields are present and
//! non-blank, independent of the pass/fail validation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use salescope_shared::ItemKeyPolicy;

use crate::fields::{is_blank, is_filled, mean, natural_key, ratio, round4};

/// Field completeness for one section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldScores {
    /// Item key → score in `[0, 1]`.
    pub item_scores: BTreeMap<String, f64>,
    /// Mean of all item scores; 0.0 for an empty section.
    pub avg_score: f64,
    /// Field → fraction of items where it is present and non-blank.
    pub field_completion_rates: BTreeMap<String, f64>,
}

/// Score every item against `required_fields`.
pub fn score_items(items: &[Value], required_fields: &[&str], policy: ItemKeyPolicy) -> FieldScores {
    let empty = Map::new();
    let mut item_scores = BTreeMap::new();
    let mut scores = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let record = item.as_object().unwrap_or(&empty);
        let score = item_score(record, required_fields);
        let key = item_key(record, idx, policy, &item_scores);
        item_scores.insert(key, score);
        scores.push(score);
    }

    FieldScores {
        item_scores,
        avg_score: mean(&scores),
        field_completion_rates: completion_rates(items, required_fields),
    }
}

/// `1 - (missing + blank) / max(1, required)`, clamped at 0 and rounded.
pub fn item_score(record: &Map<String, Value>, required_fields: &[&str]) -> f64 {
    let penalty = required_fields
        .iter()
        .filter(|f| record.get(**f).is_none_or(is_blank))
        .count();
    let denom = required_fields.len().max(1) as f64;
    round4((1.0 - penalty as f64 / denom).max(0.0))
}

fn completion_rates(items: &[Value], required_fields: &[&str]) -> BTreeMap<String, f64> {
    required_fields
        .iter()
        .map(|field| {
            let filled = items
                .iter()
                .filter_map(Value::as_object)
                .filter(|record| is_filled(record, field))
                .count();
            (field.to_string(), ratio(filled, items.len()))
        })
        .collect()
}

/// Key for the item at `idx`: its natural name, or `#idx` without one.
///
/// Under [`ItemKeyPolicy::Disambiguate`] a key never replaces an earlier one:
/// a taken key gets `#idx` appended, then a `.n` counter until it is free.
/// Positional keys are always kept distinct since they never name the item.
fn item_key(
    record: &Map<String, Value>,
    idx: usize,
    policy: ItemKeyPolicy,
    taken: &BTreeMap<String, f64>,
) -> String {
    let (base, named) = match natural_key(record) {
        Some(name) => (name.to_string(), true),
        None => (format!("#{idx}"), false),
    };
    if !taken.contains_key(&base) || (named && policy == ItemKeyPolicy::LastWins) {
        return base;
    }
    let suffixed = format!("{base}#{idx}");
    if !taken.contains_key(&suffixed) {
        return suffixed;
    }
    (2..)
        .map(|n| format!("{suffixed}.{n}"))
        .find(|key| !taken.contains_key(key))
        .unwrap_or(suffixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: [&str; 4] = ["persona_name", "industry", "location", "job_titles"];

    #[test]
    fn complete_item_scores_one() {
        let items = vec![json!({
            "persona_name": "Ops Leaders",
            "industry": "SaaS",
            "location": "US",
            "job_titles": ["VP Ops"],
        })];
        let scores = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(scores.item_scores.get("Ops Leaders"), Some(&1.0));
        assert_eq!(scores.avg_score, 1.0);
        assert!(scores.field_completion_rates.values().all(|r| *r == 1.0));
    }

    #[test]
    fn missing_and_blank_both_penalize() {
        let items = vec![json!({
            "persona_name": "Ops Leaders",
            "industry": "",
            "job_titles": [],
        })];
        let scores = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(scores.item_scores.get("Ops Leaders"), Some(&0.25));
    }

    #[test]
    fn empty_record_scores_zero_and_never_negative() {
        let record = Map::new();
        assert_eq!(item_score(&record, &FIELDS), 0.0);
        assert_eq!(item_score(&record, &[]), 1.0);
    }

    #[test]
    fn positional_fallback_key() {
        let items = vec![json!({"industry": "SaaS"}), json!(42)];
        let scores = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(scores.item_scores.get("#0"), Some(&0.25));
        assert_eq!(scores.item_scores.get("#1"), Some(&0.0));
        assert_eq!(scores.avg_score, 0.125);
    }

    #[test]
    fn collisions_follow_policy() {
        let items = vec![
            json!({"persona_name": "Ops Leaders", "industry": "SaaS"}),
            json!({"persona_name": "Ops Leaders"}),
        ];

        let kept = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(kept.item_scores.len(), 2);
        assert_eq!(kept.item_scores.get("Ops Leaders"), Some(&0.5));
        assert_eq!(kept.item_scores.get("Ops Leaders#1"), Some(&0.25));

        let overwritten = score_items(&items, &FIELDS, ItemKeyPolicy::LastWins);
        assert_eq!(overwritten.item_scores.len(), 1);
        assert_eq!(overwritten.item_scores.get("Ops Leaders"), Some(&0.25));
        // The mean still covers both items.
        assert_eq!(overwritten.avg_score, 0.375);
    }

    #[test]
    fn disambiguated_keys_never_replace_earlier_items() {
        let items = vec![
            json!({"persona_name": "A", "industry": "SaaS", "location": "US"}),
            json!({"persona_name": "A#2"}),
            json!({"persona_name": "A", "industry": "Retail"}),
        ];
        let scores = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(scores.item_scores.len(), 3);
        assert_eq!(scores.item_scores.get("A"), Some(&0.75));
        assert_eq!(scores.item_scores.get("A#2"), Some(&0.25));
        assert_eq!(scores.item_scores.get("A#2.2"), Some(&0.5));
    }

    #[test]
    fn positional_key_does_not_replace_a_named_item() {
        let items = vec![
            json!({"persona_name": "#1", "industry": "SaaS"}),
            json!({"industry": "Retail"}),
        ];
        for policy in [ItemKeyPolicy::Disambiguate, ItemKeyPolicy::LastWins] {
            let scores = score_items(&items, &FIELDS, policy);
            assert_eq!(scores.item_scores.len(), 2);
            assert_eq!(scores.item_scores.get("#1"), Some(&0.5));
            assert_eq!(scores.item_scores.get("#1#1"), Some(&0.25));
        }
    }

    #[test]
    fn completion_rates_are_per_field() {
        let items = vec![
            json!({"persona_name": "A", "industry": "SaaS"}),
            json!({"persona_name": "B", "industry": " "}),
            json!({"persona_name": "C"}),
            json!({"persona_name": ""}),
        ];
        let scores = score_items(&items, &FIELDS, ItemKeyPolicy::Disambiguate);
        assert_eq!(scores.field_completion_rates["persona_name"], 0.75);
        assert_eq!(scores.field_completion_rates["industry"], 0.25);
        assert_eq!(scores.field_completion_rates["location"], 0.0);
    }

    #[test]
    fn empty_section_rates_are_zero() {
        let scores = score_items(&[], &FIELDS, ItemKeyPolicy::Disambiguate);
        assert!(scores.item_scores.is_empty());
        assert_eq!(scores.avg_score, 0.0);
        assert_eq!(scores.field_completion_rates.len(), 4);
        assert!(scores.field_completion_rates.values().all(|r| *r == 0.0));
    }
}
