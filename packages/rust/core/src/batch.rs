//! Batch evaluation over many run directories.
//!
//! Runs are laid out either directly under the root or one level deeper
//! (`<root>/<company>/<variant>/`). A run that cannot be loaded is recorded
//! with its error and the batch carries on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use salescope_shared::{EvaluationOptions, Result, SalescopeError};

use crate::assemble::{is_run_dir, load_run_dir, payload_digest};
use crate::evaluate::evaluate_completeness_with;

/// Outcome for one run directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Path relative to the batch root, `/`-separated.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_required_only: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_including_optional: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_count: Option<usize>,
    /// SHA-256 of the assembled payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    fn failed(name: String, err: &SalescopeError) -> Self {
        Self {
            name,
            is_complete: None,
            score_required_only: None,
            score_including_optional: None,
            issue_count: None,
            payload_sha256: None,
            error: Some(err.to_string()),
        }
    }
}

/// Result of a batch evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_runs: usize,
    pub complete_runs: usize,
    pub failed_runs: usize,
    pub runs: Vec<RunSummary>,
    pub elapsed_ms: u128,
}

/// Progress callback for batch evaluation.
pub trait ProgressReporter: Send + Sync {
    /// Called once the runs to evaluate are known.
    fn started(&self, total: usize);
    /// Called after each run, successful or not.
    fn run_finished(&self, run: &RunSummary, current: usize, total: usize);
    /// Called when the batch completes.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn started(&self, _total: usize) {}
    fn run_finished(&self, _run: &RunSummary, _current: usize, _total: usize) {}
    fn done(&self, _summary: &BatchSummary) {}
}

/// Run directories under `root`, sorted by path.
pub fn discover_runs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SalescopeError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    if is_run_dir(root) {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut runs = Vec::new();
    for child in subdirs(root)? {
        if is_run_dir(&child) {
            runs.push(child);
            continue;
        }
        runs.extend(subdirs(&child)?.into_iter().filter(|d| is_run_dir(d)));
    }
    runs.sort();
    Ok(runs)
}

/// Evaluate every run directory under `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn evaluate_runs(
    root: &Path,
    options: &EvaluationOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary> {
    let start = Instant::now();
    let dirs = discover_runs(root)?;
    let total = dirs.len();
    info!(runs = total, "starting batch evaluation");
    progress.started(total);

    let mut runs = Vec::with_capacity(total);
    for (idx, dir) in dirs.iter().enumerate() {
        let name = run_name(root, dir);
        let summary = match evaluate_run(&name, dir, options) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(run = %name, error = %e, "run could not be evaluated");
                RunSummary::failed(name, &e)
            }
        };
        progress.run_finished(&summary, idx + 1, total);
        runs.push(summary);
    }

    let summary = BatchSummary {
        total_runs: total,
        complete_runs: runs.iter().filter(|r| r.is_complete == Some(true)).count(),
        failed_runs: runs.iter().filter(|r| r.error.is_some()).count(),
        runs,
        elapsed_ms: start.elapsed().as_millis(),
    };

    info!(
        total = summary.total_runs,
        complete = summary.complete_runs,
        failed = summary.failed_runs,
        elapsed_ms = summary.elapsed_ms,
        "batch evaluation done"
    );
    progress.done(&summary);
    Ok(summary)
}

fn evaluate_run(name: &str, dir: &Path, options: &EvaluationOptions) -> Result<RunSummary> {
    let run = load_run_dir(dir)?;
    let digest = payload_digest(&serde_json::to_vec(&run.payload)?);
    let report = evaluate_completeness_with(&run.payload, options)?;
    Ok(RunSummary {
        name: name.to_string(),
        is_complete: Some(report.is_complete),
        score_required_only: Some(report.score_required_only),
        score_including_optional: Some(report.score_including_optional),
        issue_count: Some(report.issue_count()),
        payload_sha256: Some(digest),
        error: None,
    })
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SalescopeError::io(dir, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SalescopeError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn run_name(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    if relative.as_os_str().is_empty() {
        return root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
    }
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
