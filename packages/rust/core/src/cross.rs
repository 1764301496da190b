//! Referential checks spanning several sections.
//!
//! No schema re-validation happens here: structurally broken records are the
//! list validator's concern. Only string `persona_name` values take part.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, instrument};

use salescope_shared::{CrossComponentCheck, FieldPath, Issue, IssueKind, SectionKind};

use crate::payload::PipelineSections;

const PERSONA_NAME: &str = "persona_name";

/// Check persona references and persona name uniqueness.
#[instrument(skip_all)]
pub fn check_cross_component(sections: &PipelineSections<'_>) -> CrossComponentCheck {
    let known: BTreeSet<&str> = sections
        .personas
        .iter()
        .filter_map(persona_name)
        .collect();

    let mut issues = Vec::new();
    dangling_references(
        SectionKind::PersonasWithMappings,
        sections.personas_with_mappings,
        &known,
        &mut issues,
    );
    if let Some(sequences) = sections.sequences {
        dangling_references(SectionKind::Sequences, sequences, &known, &mut issues);
    }
    duplicate_personas(sections.personas, &mut issues);

    debug!(known_personas = known.len(), issues = issues.len(), "cross-component check done");

    CrossComponentCheck {
        passed: issues.is_empty(),
        issues,
    }
}

/// Non-blank string `persona_name`, taken verbatim.
fn persona_name(item: &Value) -> Option<&str> {
    item.get(PERSONA_NAME)
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
}

fn dangling_references(
    section: SectionKind,
    items: &[Value],
    known: &BTreeSet<&str>,
    issues: &mut Vec<Issue>,
) {
    for (idx, item) in items.iter().enumerate() {
        let Some(name) = persona_name(item) else {
            continue;
        };
        if known.contains(name) {
            continue;
        }
        issues.push(Issue::error(
            FieldPath::field(section.as_str()).index(idx).join(PERSONA_NAME),
            IssueKind::Reference,
            format!("persona_name '{name}' not found in personas"),
        ));
    }
}

/// One issue per duplicated name, placed at its first repeat.
fn duplicate_personas(personas: &[Value], issues: &mut Vec<Issue>) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, item) in personas.iter().enumerate() {
        let Some(name) = persona_name(item) else {
            continue;
        };
        let count = seen.entry(name).or_default();
        *count += 1;
        if *count == 2 {
            issues.push(Issue::error(
                FieldPath::field(SectionKind::Personas.as_str())
                    .index(idx)
                    .join(PERSONA_NAME),
                IssueKind::Duplicate,
                format!("duplicate persona_name '{name}'"),
            ));
        }
    }
}
