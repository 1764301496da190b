//! Persona coverage metrics.
//!
//! How well a persona set spans the market: distinct industries, locations
//! and company sizes, and whether tiers follow the target mix. Only personas
//! that decode cleanly take part; the rest are counted as skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use salescope_shared::Result;

use crate::fields::{ratio, round4};
use crate::payload::PipelineSections;
use crate::schema::{BuyerPersona, Entity, PersonaTier};

/// Target share of each tier, in percent (inclusive).
const TIER_TARGETS: [(PersonaTier, f64, f64); 3] = [
    (PersonaTier::Tier1, 30.0, 40.0),
    (PersonaTier::Tier2, 40.0, 50.0),
    (PersonaTier::Tier3, 10.0, 20.0),
];

const MIN_INDUSTRY_DIVERSITY: f64 = 0.8;
const MIN_LOCATION_DIVERSITY: f64 = 0.6;

/// Distinct values of one persona attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub unique: usize,
    pub total: usize,
    /// `unique / total`; 0.0 without personas.
    pub diversity_score: f64,
    pub counts: BTreeMap<String, usize>,
}

impl Distribution {
    fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0;
        for value in values {
            *counts.entry(value.trim().to_string()).or_default() += 1;
            total += 1;
        }
        Self {
            unique: counts.len(),
            total,
            diversity_score: ratio(counts.len(), total),
            counts,
        }
    }
}

/// Tier mix against the target ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierBalance {
    pub counts: BTreeMap<PersonaTier, usize>,
    /// Tier → share in percent.
    pub percentages: BTreeMap<PersonaTier, f64>,
    pub is_balanced: bool,
}

impl TierBalance {
    fn from_tiers(tiers: &[PersonaTier]) -> Self {
        let mut counts: BTreeMap<PersonaTier, usize> =
            PersonaTier::ALL.iter().map(|t| (*t, 0)).collect();
        for tier in tiers {
            *counts.entry(*tier).or_default() += 1;
        }
        let percentages: BTreeMap<PersonaTier, f64> = counts
            .iter()
            .map(|(tier, count)| (*tier, round4(ratio(*count, tiers.len()) * 100.0)))
            .collect();
        let is_balanced = !tiers.is_empty()
            && TIER_TARGETS.iter().all(|(tier, lo, hi)| {
                let pct = percentages.get(tier).copied().unwrap_or(0.0);
                (*lo..=*hi).contains(&pct)
            });
        Self {
            counts,
            percentages,
            is_balanced,
        }
    }
}

/// Coverage metrics for one persona set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonaCoverage {
    pub total_personas: usize,
    /// Personas left out because they have blocking validation issues.
    pub skipped_personas: usize,
    pub industry: Distribution,
    pub location: Distribution,
    pub company_size: Distribution,
    pub tiers: TierBalance,
    pub recommendations: Vec<String>,
}

/// Coverage of the `personas` section of a payload.
pub fn coverage_from_payload(payload: &Value) -> Result<PersonaCoverage> {
    let sections = PipelineSections::from_payload(payload)?;
    Ok(persona_coverage(sections.personas))
}

/// Compute coverage over raw persona records.
#[instrument(skip_all, fields(personas = personas.len()))]
pub fn persona_coverage(personas: &[Value]) -> PersonaCoverage {
    let decoded: Vec<BuyerPersona> = personas.iter().filter_map(BuyerPersona::decode).collect();
    let skipped_personas = personas.len() - decoded.len();

    let industry = Distribution::from_values(decoded.iter().map(|p| p.industry.as_str()));
    let location = Distribution::from_values(decoded.iter().map(|p| p.location.as_str()));
    let company_size =
        Distribution::from_values(decoded.iter().map(|p| p.company_size_range.as_str()));
    let tiers = TierBalance::from_tiers(&decoded.iter().map(|p| p.tier).collect::<Vec<_>>());

    let mut coverage = PersonaCoverage {
        total_personas: personas.len(),
        skipped_personas,
        industry,
        location,
        company_size,
        tiers,
        recommendations: Vec::new(),
    };
    coverage.recommendations = recommendations(&coverage, &decoded);

    debug!(
        decoded = decoded.len(),
        skipped_personas,
        balanced = coverage.tiers.is_balanced,
        "persona coverage computed"
    );
    coverage
}

fn recommendations(coverage: &PersonaCoverage, decoded: &[BuyerPersona]) -> Vec<String> {
    if decoded.is_empty() {
        return vec!["No valid personas to assess. Fix validation issues first.".to_string()];
    }

    let mut out = Vec::new();
    if coverage.skipped_personas > 0 {
        out.push(format!(
            "{} of {} personas failed validation and were not assessed.",
            coverage.skipped_personas, coverage.total_personas
        ));
    }
    if coverage.industry.diversity_score < MIN_INDUSTRY_DIVERSITY {
        out.push(format!(
            "Only {} unique industries for {} personas. Consider diversifying industries.",
            coverage.industry.unique, coverage.industry.total
        ));
    }
    if coverage.location.diversity_score < MIN_LOCATION_DIVERSITY {
        out.push(format!(
            "Limited geographic diversity: {} unique locations. Consider adding personas from different regions.",
            coverage.location.unique
        ));
    }
    if !coverage.tiers.is_balanced {
        out.push("Tier distribution is not balanced. Aim for tier_1 30-40%, tier_2 40-50%, tier_3 10-20%.".to_string());
    }

    // Personas sharing industry, location and size describe the same segment.
    let segments: BTreeSet<(&str, &str, &str)> = decoded
        .iter()
        .map(|p| {
            (
                p.industry.trim(),
                p.location.trim(),
                p.company_size_range.trim(),
            )
        })
        .collect();
    if segments.len() < decoded.len() {
        out.push(format!(
            "{} personas overlap on industry, location and company size.",
            decoded.len() - segments.len()
        ));
    }

    if out.is_empty() {
        out.push("All metrics look good. Personas are well diversified.".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persona(name: &str, tier: &str, industry: &str, location: &str, size: &str) -> Value {
        json!({
            "persona_name": name,
            "tier": tier,
            "job_titles": [
                "VP Sales", "CRO", "Head of Sales", "VP Revenue", "Sales Director",
                "Director of Sales Operations", "VP Sales Operations", "Head of Revenue Operations",
                "Chief Revenue Officer", "SVP Sales"
            ],
            "excluded_job_titles": ["Intern", "HR Manager", "IT Support"],
            "industry": industry,
            "company_size_range": size,
            "company_type": "B2B company",
            "location": location,
            "description": "Teams of 20-50 reps, $40k deals, 60-day cycles, 4 stakeholders."
        })
    }

    fn balanced_set() -> Vec<Value> {
        let tiers = [
            "tier_1", "tier_1", "tier_1", "tier_2", "tier_2", "tier_2", "tier_2", "tier_3",
            "tier_3", "tier_1",
        ];
        tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| {
                persona(
                    &format!("Persona {i}"),
                    tier,
                    &format!("Industry {i}"),
                    &format!("Region {i}"),
                    &format!("{}-{} employees", i * 100, i * 100 + 99),
                )
            })
            .collect()
    }

    #[test]
    fn balanced_diverse_set_gets_clean_bill() {
        let coverage = persona_coverage(&balanced_set());
        assert_eq!(coverage.total_personas, 10);
        assert_eq!(coverage.skipped_personas, 0);
        assert_eq!(coverage.industry.diversity_score, 1.0);
        assert_eq!(coverage.tiers.percentages[&PersonaTier::Tier1], 40.0);
        assert_eq!(coverage.tiers.percentages[&PersonaTier::Tier3], 20.0);
        assert!(coverage.tiers.is_balanced);
        assert_eq!(coverage.recommendations.len(), 1);
        assert!(coverage.recommendations[0].starts_with("All metrics look good"));
    }

    #[test]
    fn repeated_segments_lower_diversity() {
        let personas = vec![
            persona("A", "tier_1", "SaaS", "US", "200-800"),
            persona("B", "tier_2", "SaaS", "US", "200-800"),
            persona("C", "tier_2", "Retail", "US", "200-800"),
        ];
        let coverage = persona_coverage(&personas);
        assert_eq!(coverage.industry.unique, 2);
        assert_eq!(coverage.industry.counts["SaaS"], 2);
        assert_eq!(coverage.industry.diversity_score, 0.6667);
        assert_eq!(coverage.location.diversity_score, 0.3333);
        assert!(!coverage.tiers.is_balanced);
        assert!(coverage.recommendations.iter().any(|r| r.contains("unique industries")));
        assert!(coverage.recommendations.iter().any(|r| r.contains("overlap")));
    }

    #[test]
    fn invalid_personas_are_skipped() {
        let mut broken = persona("Broken", "tier_9", "SaaS", "US", "1-10");
        broken["industry"] = json!("");
        let personas = vec![broken, json!("not a persona"), persona("Ok", "tier_1", "SaaS", "US", "1-10")];

        let coverage = persona_coverage(&personas);
        assert_eq!(coverage.total_personas, 3);
        assert_eq!(coverage.skipped_personas, 2);
        assert_eq!(coverage.industry.total, 1);
        assert!(coverage.recommendations[0].starts_with("2 of 3 personas"));
    }

    #[test]
    fn empty_set_is_safe() {
        let coverage = persona_coverage(&[]);
        assert_eq!(coverage.industry.diversity_score, 0.0);
        assert!(!coverage.tiers.is_balanced);
        assert_eq!(coverage.tiers.counts.len(), 3);
        assert_eq!(coverage.recommendations.len(), 1);
    }

    #[test]
    fn tiers_serialize_by_wire_name() {
        let coverage = persona_coverage(&balanced_set());
        let value = serde_json::to_value(&coverage.tiers).expect("serialize");
        assert_eq!(value["counts"]["tier_2"], 4);
    }

    #[test]
    fn fixture_personas_are_assessed() {
        let raw = std::fs::read_to_string("../../../fixtures/json/pipeline_complete.fixture.json")
            .expect("read fixture");
        let payload: Value = serde_json::from_str(&raw).expect("parse fixture");
        let coverage = coverage_from_payload(&payload).expect("coverage");
        assert_eq!(coverage.total_personas, 2);
        assert_eq!(coverage.skipped_personas, 0);
        assert_eq!(coverage.industry.unique, 2);
    }
}
