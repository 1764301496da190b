//! Structured field locators for issues.
//!
//! A [`FieldPath`] is a list of field-name and index tokens. On the wire it is
//! the dotted/bracket string (`sequences[2].touches[0].objective`), with list
//! indices attached to the preceding segment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SalescopeError;

/// One token of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field.
    Field(String),
    /// A concrete list position.
    Index(usize),
    /// Any list position (rendered `[]`), used for per-field aggregation keys.
    AnyIndex,
}

/// Location of a value inside a pipeline payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (the payload root).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A path consisting of a single field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(name.into())])
    }

    /// Extend with a named field.
    pub fn join(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Extend with a list index.
    pub fn index(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(idx));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path with every concrete index replaced by `[]`.
    pub fn generalized(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|seg| match seg {
                    PathSegment::Index(_) => PathSegment::AnyIndex,
                    other => other.clone(),
                })
                .collect(),
        )
    }

    /// The path with its first `n` segments removed.
    pub fn strip_prefix(&self, n: usize) -> Self {
        Self(self.0.iter().skip(n).cloned().collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            match seg {
                PathSegment::Field(name) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::AnyIndex => f.write_str("[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = SalescopeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self(segments));
        }

        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if !name.is_empty() {
                segments.push(PathSegment::Field(name.to_string()));
            } else if rest.is_empty() {
                return Err(SalescopeError::parse(format!("empty segment in path '{s}'")));
            }

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .filter(|_| rest.starts_with('['))
                    .ok_or_else(|| SalescopeError::parse(format!("unbalanced index in path '{s}'")))?;
                let inner = &rest[1..close];
                if inner.is_empty() {
                    segments.push(PathSegment::AnyIndex);
                } else {
                    let idx = inner
                        .parse::<usize>()
                        .map_err(|e| SalescopeError::parse(format!("bad index in path '{s}': {e}")))?;
                    segments.push(PathSegment::Index(idx));
                }
                rest = &rest[close + 1..];
            }
        }

        Ok(Self(segments))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_attach_to_previous_segment() {
        let path = FieldPath::field("sequences").index(2).join("touches").index(0);
        assert_eq!(path.to_string(), "sequences[2].touches[0]");
    }

    #[test]
    fn leading_index_renders_bare() {
        let path = FieldPath::root().index(3).join("name");
        assert_eq!(path.to_string(), "[3].name");
    }

    #[test]
    fn generalized_replaces_indices() {
        let path = FieldPath::field("personas_with_mappings")
            .index(0)
            .join("mappings")
            .index(4)
            .join("pain_point");
        assert_eq!(path.strip_prefix(2).generalized().to_string(), "mappings[].pain_point");
    }

    #[test]
    fn parse_matches_display() {
        for s in [
            "product_name",
            "sequences[2].touches[0].subject_line",
            "mappings[].pain_point",
            "[0]",
        ] {
            let path: FieldPath = s.parse().expect("parse path");
            assert_eq!(path.to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("touches[1".parse::<FieldPath>().is_err());
        assert!("touches[x]".parse::<FieldPath>().is_err());
        assert!("a..b".parse::<FieldPath>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let path = FieldPath::field("personas").index(1).join("persona_name");
        let json = serde_json::to_string(&path).expect("serialize");
        assert_eq!(json, "\"personas[1].persona_name\"");
    }
}
