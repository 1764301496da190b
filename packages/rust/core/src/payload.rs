//! Payload shape handling.
//!
//! A pipeline payload is a JSON object with up to four list-valued keys.
//! Keys that are absent or `null` are read as empty lists; keys holding
//! anything other than a list are read as empty and the shape defect is
//! recorded against the section.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use salescope_shared::{FieldPath, Issue, IssueKind, Result, SalescopeError, SectionKind};

/// Borrowed view over the sections of one payload.
#[derive(Debug, Clone, Default)]
pub struct PipelineSections<'a> {
    pub products: &'a [Value],
    pub personas: &'a [Value],
    pub personas_with_mappings: &'a [Value],
    /// `None` when the payload has no `sequences` key at all.
    pub sequences: Option<&'a [Value]>,
    shape_issues: BTreeMap<SectionKind, Issue>,
}

impl<'a> PipelineSections<'a> {
    /// Split `payload` into its sections.
    ///
    /// Only a payload that is not a JSON object is rejected.
    pub fn from_payload(payload: &'a Value) -> Result<Self> {
        let Some(root) = payload.as_object() else {
            return Err(SalescopeError::payload(format!(
                "expected a JSON object with pipeline sections, got {}",
                json_kind(payload)
            )));
        };

        let mut shape_issues = BTreeMap::new();
        let mut read = |kind: SectionKind| -> &'a [Value] {
            let (items, issue) = section_items(root, kind);
            if let Some(issue) = issue {
                shape_issues.insert(kind, issue);
            }
            items
        };

        let products = read(SectionKind::Products);
        let personas = read(SectionKind::Personas);
        let personas_with_mappings = read(SectionKind::PersonasWithMappings);
        let sequences = if root.contains_key(SectionKind::Sequences.as_str()) {
            Some(read(SectionKind::Sequences))
        } else {
            None
        };

        Ok(Self {
            products,
            personas,
            personas_with_mappings,
            sequences,
            shape_issues,
        })
    }

    /// Items of `kind`; empty when the section is absent.
    pub fn items(&self, kind: SectionKind) -> &'a [Value] {
        match kind {
            SectionKind::Products => self.products,
            SectionKind::Personas => self.personas,
            SectionKind::PersonasWithMappings => self.personas_with_mappings,
            SectionKind::Sequences => self.sequences.unwrap_or(&[]),
        }
    }

    /// Whether the payload carries the optional `sequences` key.
    pub fn has_sequences(&self) -> bool {
        self.sequences.is_some()
    }

    /// The shape defect recorded for `kind`, if its value was not a list.
    pub fn shape_issue(&self, kind: SectionKind) -> Option<&Issue> {
        self.shape_issues.get(&kind)
    }
}

fn section_items(root: &Map<String, Value>, kind: SectionKind) -> (&[Value], Option<Issue>) {
    match root.get(kind.as_str()) {
        None | Some(Value::Null) => (&[], None),
        Some(Value::Array(items)) => (items.as_slice(), None),
        Some(other) => {
            warn!(section = %kind, found = json_kind(other), "section is not a list, treating as empty");
            let issue = Issue::error(
                FieldPath::field(kind.as_str()),
                IssueKind::NotList,
                format!("Input should be a valid list, got {}", json_kind(other)),
            );
            (&[], Some(issue))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
