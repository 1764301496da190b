//! Outreach sequence metrics.
//!
//! Graded scores for sequence structure (touch count, duration, cadence,
//! ordering) and channel mix. Validation already decides pass/fail; these
//! scores rank sequences that pass. Only sequences that decode cleanly take
//! part; the rest are counted as skipped.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use salescope_shared::{Result, SectionKind};

use crate::fields::{mean, round4};
use crate::payload::PipelineSections;
use crate::schema::{Entity, OutreachSequence, TouchType};

/// Days between consecutive touches that count as a good cadence.
const IDEAL_INTERVAL: (i64, i64) = (2, 3);

/// Each cadence issue costs this much of the timing score.
const TIMING_ISSUE_PENALTY: f64 = 0.2;

/// Score a value against an ideal window and a looser acceptable one.
fn banded(value: i64, ideal: (i64, i64), acceptable: (i64, i64)) -> f64 {
    if (ideal.0..=ideal.1).contains(&value) {
        1.0
    } else if (acceptable.0..=acceptable.1).contains(&value) {
        0.5
    } else {
        0.0
    }
}

/// Structure sub-scores for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureScore {
    pub touches_count: u32,
    /// 1.0 for 4-6 touches, 0.5 for 3 or 7.
    pub touches_count_score: f64,
    pub duration_days: u32,
    /// 1.0 for 10-21 days, 0.5 for 7-25.
    pub duration_score: f64,
    /// First touch on day 0 and timings strictly increasing.
    pub timing_valid: bool,
    pub timing_issues: Vec<String>,
    pub timing_score: f64,
    pub sort_order_valid: bool,
    pub sort_order_score: f64,
    pub last_timing_match: bool,
    pub duration_match_score: f64,
    pub overall: f64,
}

impl StructureScore {
    pub fn of(sequence: &OutreachSequence) -> Self {
        let touches_count_score = banded(sequence.total_touches.into(), (4, 6), (3, 7));
        let duration_score = banded(sequence.duration_days.into(), (10, 21), (7, 25));

        let mut timing_valid = true;
        let mut timing_issues = Vec::new();
        let mut prev: Option<i64> = None;
        for touch in &sequence.touches {
            let timing = i64::from(touch.timing_days);
            let Some(before) = prev else {
                if timing != 0 {
                    timing_valid = false;
                    timing_issues.push(format!(
                        "Touch {}: first touch timing_days should be 0, got {timing}",
                        touch.sort_order
                    ));
                }
                prev = Some(timing);
                continue;
            };
            if timing <= before {
                timing_valid = false;
                timing_issues.push(format!(
                    "Touch {}: timing_days ({timing}) should be greater than previous ({before})",
                    touch.sort_order
                ));
            }
            let interval = timing - before;
            if !(IDEAL_INTERVAL.0..=IDEAL_INTERVAL.1).contains(&interval) {
                timing_issues.push(format!(
                    "Touch {}: interval of {interval} days, ideal is {}-{} days",
                    touch.sort_order, IDEAL_INTERVAL.0, IDEAL_INTERVAL.1
                ));
            }
            prev = Some(timing);
        }
        let timing_score = if timing_issues.is_empty() {
            1.0
        } else {
            round4((1.0 - timing_issues.len() as f64 * TIMING_ISSUE_PENALTY).max(0.0))
        };

        let sort_order_valid = sequence
            .touches
            .iter()
            .enumerate()
            .all(|(pos, touch)| touch.sort_order as usize == pos + 1);
        let sort_order_score = if sort_order_valid { 1.0 } else { 0.5 };

        let last_timing_match = sequence
            .touches
            .last()
            .is_some_and(|t| t.timing_days == sequence.duration_days);
        let duration_match_score = if last_timing_match { 1.0 } else { 0.5 };

        let overall = round4(
            touches_count_score * 0.2
                + duration_score * 0.2
                + timing_score * 0.3
                + sort_order_score * 0.15
                + duration_match_score * 0.15,
        );

        Self {
            touches_count: sequence.total_touches,
            touches_count_score,
            duration_days: sequence.duration_days,
            duration_score,
            timing_valid,
            timing_issues,
            timing_score,
            sort_order_valid,
            sort_order_score,
            last_timing_match,
            duration_match_score,
            overall,
        }
    }
}

/// Channel mix for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMix {
    /// Channel → number of touches.
    pub type_counts: BTreeMap<&'static str, usize>,
    pub has_email: bool,
    pub has_linkedin: bool,
    /// A phone or video touch is present.
    pub has_call: bool,
    /// 0.3 for email, 0.3 for LinkedIn, 0.4 for a call.
    pub diversity_score: f64,
    /// Email should lead the mix and calls should not outnumber emails.
    pub distribution_score: f64,
    pub call_at_end: bool,
    pub call_placement_score: f64,
    pub overall: f64,
}

impl ChannelMix {
    pub fn of(sequence: &OutreachSequence) -> Self {
        let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for touch in &sequence.touches {
            *type_counts.entry(touch.touch_type.as_str()).or_default() += 1;
        }
        let count = |kind: TouchType| type_counts.get(kind.as_str()).copied().unwrap_or(0);
        let email = count(TouchType::Email);
        let linkedin = count(TouchType::Linkedin);
        let calls = count(TouchType::Phone) + count(TouchType::Video);

        let has_email = email > 0;
        let has_linkedin = linkedin > 0;
        let has_call = calls > 0;
        let diversity_score = round4(
            if has_email { 0.3 } else { 0.0 }
                + if has_linkedin { 0.3 } else { 0.0 }
                + if has_call { 0.4 } else { 0.0 },
        );

        let mut distribution_score = 1.0;
        if email < linkedin {
            distribution_score -= 0.2;
        }
        if calls > email {
            distribution_score -= 0.3;
        }
        let distribution_score = round4(distribution_score);

        let call_at_end = sequence
            .touches
            .last()
            .is_some_and(|t| !t.touch_type.expects_subject_line());
        let call_placement_score = if call_at_end { 1.0 } else { 0.7 };

        let overall = round4(
            diversity_score * 0.5 + distribution_score * 0.3 + call_placement_score * 0.2,
        );

        Self {
            type_counts,
            has_email,
            has_linkedin,
            has_call,
            diversity_score,
            distribution_score,
            call_at_end,
            call_placement_score,
            overall,
        }
    }
}

/// Metrics for one decoded sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceMetrics {
    pub persona_name: String,
    pub sequence_name: String,
    pub structure: StructureScore,
    pub channels: ChannelMix,
    /// Mean of the structure and channel scores.
    pub overall: f64,
}

impl SequenceMetrics {
    pub fn of(sequence: &OutreachSequence) -> Self {
        let structure = StructureScore::of(sequence);
        let channels = ChannelMix::of(sequence);
        let overall = mean(&[structure.overall, channels.overall]);
        Self {
            persona_name: sequence.persona_name.clone(),
            sequence_name: sequence.name.clone(),
            structure,
            channels,
            overall,
        }
    }
}

/// Metrics across every sequence of a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutreachMetrics {
    pub total_sequences: usize,
    /// Sequences left out because they have blocking validation issues.
    pub skipped_sequences: usize,
    pub avg_structure_score: f64,
    pub avg_channel_score: f64,
    pub avg_overall_score: f64,
    /// Channel → touches across all assessed sequences.
    pub channel_totals: BTreeMap<&'static str, usize>,
    pub sequences: Vec<SequenceMetrics>,
}

/// Metrics for the `sequences` section of a payload.
pub fn outreach_from_payload(payload: &Value) -> Result<OutreachMetrics> {
    let sections = PipelineSections::from_payload(payload)?;
    Ok(outreach_metrics(sections.items(SectionKind::Sequences)))
}

/// Compute metrics over raw sequence records.
#[instrument(skip_all, fields(sequences = sequences.len()))]
pub fn outreach_metrics(sequences: &[Value]) -> OutreachMetrics {
    let assessed: Vec<SequenceMetrics> = sequences
        .iter()
        .filter_map(OutreachSequence::decode)
        .map(|s| SequenceMetrics::of(&s))
        .collect();

    let mut channel_totals: BTreeMap<&'static str, usize> = BTreeMap::new();
    for metrics in &assessed {
        for (channel, count) in &metrics.channels.type_counts {
            *channel_totals.entry(*channel).or_default() += count;
        }
    }

    let scores = |pick: fn(&SequenceMetrics) -> f64| -> Vec<f64> {
        assessed.iter().map(pick).collect()
    };
    let metrics = OutreachMetrics {
        total_sequences: sequences.len(),
        skipped_sequences: sequences.len() - assessed.len(),
        avg_structure_score: mean(&scores(|m| m.structure.overall)),
        avg_channel_score: mean(&scores(|m| m.channels.overall)),
        avg_overall_score: mean(&scores(|m| m.overall)),
        channel_totals,
        sequences: assessed,
    };

    debug!(
        assessed = metrics.sequences.len(),
        skipped = metrics.skipped_sequences,
        avg_overall = metrics.avg_overall_score,
        "outreach metrics computed"
    );
    metrics
}
