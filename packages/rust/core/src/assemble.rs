//! Run-directory assembly.
//!
//! A generation run writes one JSON file per pipeline stage. This module
//! classifies those files by name and merges them into a single payload
//! ready for [`evaluate_completeness`](crate::evaluate_completeness).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use salescope_shared::{Result, SalescopeError, SectionKind};

/// A payload assembled from a run directory.
#[derive(Debug, Clone)]
pub struct RunPayload {
    pub payload: Value,
    /// Section → file it was read from.
    pub sources: BTreeMap<SectionKind, PathBuf>,
}

/// Section a stage file belongs to, judged by its lowercase file stem.
///
/// `product` wins over everything, `mapping` over `persona`.
pub fn classify_stage(stem: &str) -> Option<SectionKind> {
    let stem = stem.to_lowercase();
    if stem.contains("product") {
        Some(SectionKind::Products)
    } else if stem.contains("mapping") {
        Some(SectionKind::PersonasWithMappings)
    } else if stem.contains("persona") {
        Some(SectionKind::Personas)
    } else if stem.contains("outreach") || stem.contains("sequence") {
        Some(SectionKind::Sequences)
    } else {
        None
    }
}

/// Whether `dir` holds at least one recognizable stage file.
pub fn is_run_dir(dir: &Path) -> bool {
    stage_files(dir).is_ok_and(|files| !files.is_empty())
}

/// Build a payload from the stage files in `dir`.
///
/// Files are read in name order; when two files map to the same section the
/// later one wins. Sections without a file are left out of the payload.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_run_dir(dir: &Path) -> Result<RunPayload> {
    let mut payload = Map::new();
    let mut sources = BTreeMap::new();

    for (section, path) in stage_files(dir)? {
        let content =
            std::fs::read_to_string(&path).map_err(|e| SalescopeError::io(&path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            SalescopeError::parse(format!("invalid JSON in {}: {e}", path.display()))
        })?;

        if let Some(previous) = sources.insert(section, path.clone()) {
            warn!(
                section = %section,
                replaced = %previous.display(),
                by = %path.display(),
                "several stage files for one section, keeping the last"
            );
        }
        debug!(section = %section, path = %path.display(), "loaded stage file");
        payload.insert(section.as_str().to_string(), unwrap_section(section, value));
    }

    info!(sections = sources.len(), "run directory assembled");
    Ok(RunPayload {
        payload: Value::Object(payload),
        sources,
    })
}

/// Hex SHA-256 of raw payload bytes.
pub fn payload_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Recognized `*.json` files in `dir`, sorted by file name.
fn stage_files(dir: &Path) -> Result<Vec<(SectionKind, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SalescopeError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SalescopeError::io(dir, e))?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match classify_stage(stem) {
            Some(section) => files.push((section, path)),
            None => debug!(path = %path.display(), "skipping unrecognized file"),
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// A stage file holds the bare list, an object keyed by section, or either
/// of those under a top-level `result` envelope.
fn unwrap_section(section: SectionKind, value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.contains_key(section.as_str()) => obj
            .remove(section.as_str())
            .unwrap_or(Value::Null),
        Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("result") => {
            match obj.remove("result") {
                Some(Value::Object(mut inner)) if inner.contains_key(section.as_str()) => inner
                    .remove(section.as_str())
                    .unwrap_or(Value::Null),
                Some(inner @ Value::Array(_)) => inner,
                Some(other) => {
                    obj.insert("result".to_string(), other);
                    Value::Object(obj)
                }
                None => Value::Object(obj),
            }
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "salescope-assemble-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, name: &str, value: &Value) {
        std::fs::write(dir.join(name), serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn classify_by_stem() {
        assert_eq!(classify_stage("products"), Some(SectionKind::Products));
        assert_eq!(classify_stage("Buyer_Personas"), Some(SectionKind::Personas));
        assert_eq!(
            classify_stage("persona_mappings"),
            Some(SectionKind::PersonasWithMappings)
        );
        assert_eq!(classify_stage("outreach_plan"), Some(SectionKind::Sequences));
        assert_eq!(classify_stage("sequences_v2"), Some(SectionKind::Sequences));
        assert_eq!(classify_stage("run_metadata"), None);
    }

    #[test]
    fn load_merges_stage_files() {
        let dir = temp_dir();
        write(&dir, "products.json", &json!([{"product_name": "Sales Cloud"}]));
        write(&dir, "personas.json", &json!({"personas": [{"persona_name": "A"}]}));
        write(&dir, "mappings.json", &json!([]));
        write(&dir, "timings.json", &json!({"total_seconds": 12}));
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let run = load_run_dir(&dir).unwrap();
        assert_eq!(run.sources.len(), 3);
        assert_eq!(run.payload["products"][0]["product_name"], "Sales Cloud");
        assert_eq!(run.payload["personas"][0]["persona_name"], "A");
        assert!(run.payload["personas_with_mappings"].is_array());
        assert!(run.payload.get("sequences").is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn result_envelope_is_unwrapped() {
        let dir = temp_dir();
        write(
            &dir,
            "products.json",
            &json!({"result": {"products": [{"product_name": "Sales Cloud"}]}}),
        );
        write(&dir, "personas.json", &json!({"result": [{"persona_name": "A"}]}));
        write(&dir, "sequences.json", &json!({"result": {"status": "pending"}}));

        let run = load_run_dir(&dir).unwrap();
        assert_eq!(run.payload["products"][0]["product_name"], "Sales Cloud");
        assert_eq!(run.payload["personas"][0]["persona_name"], "A");
        // An envelope without the section is left for validation to reject.
        assert_eq!(run.payload["sequences"]["result"]["status"], "pending");

        let report = crate::evaluate_completeness(&run.payload).unwrap();
        let products = report.section(SectionKind::Products).unwrap();
        assert_eq!(products.total_items, 1);
        let sequences = report.section(SectionKind::Sequences).unwrap();
        assert_eq!(sequences.total_items, 0);
        assert!(!sequences.errors.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn later_file_wins_for_same_section() {
        let dir = temp_dir();
        write(&dir, "a_products.json", &json!([{"product_name": "First"}]));
        write(&dir, "b_products.json", &json!([{"product_name": "Second"}]));

        let run = load_run_dir(&dir).unwrap();
        assert_eq!(run.payload["products"][0]["product_name"], "Second");
        assert!(run.sources[&SectionKind::Products].ends_with("b_products.json"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = temp_dir();
        std::fs::write(dir.join("personas.json"), "{oops").unwrap();

        let err = load_run_dir(&dir).unwrap_err();
        assert!(matches!(err, SalescopeError::Parse { .. }));
        assert!(err.to_string().contains("personas.json"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_dir_is_io_error() {
        let dir = temp_dir().join("does-not-exist");
        assert!(matches!(load_run_dir(&dir), Err(SalescopeError::Io { .. })));
        assert!(!is_run_dir(&dir));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let digest = payload_digest(b"{}");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, payload_digest(b"{}"));
        assert_ne!(digest, payload_digest(b"[]"));
        assert_eq!(
            payload_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
