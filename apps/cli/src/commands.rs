//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use salescope_core::{
    BatchSummary, ProgressReporter, RunSummary, coverage_from_payload,
    evaluate_completeness_with, evaluate_runs, load_run_dir, outreach_from_payload,
    payload_digest,
};
use salescope_shared::{
    AppConfig, EvaluationOptions, ItemKeyPolicy, SalescopeError, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Salescope: check generated sales pipelines for completeness.
#[derive(Parser)]
#[command(
    name = "salescope",
    version,
    about = "Validate and score sales-intelligence pipeline output.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// How colliding item names are keyed in per-item scores.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ItemKeyArg {
    Disambiguate,
    LastWins,
}

impl From<ItemKeyArg> for ItemKeyPolicy {
    fn from(arg: ItemKeyArg) -> Self {
        match arg {
            ItemKeyArg::Disambiguate => ItemKeyPolicy::Disambiguate,
            ItemKeyArg::LastWins => ItemKeyPolicy::LastWins,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Evaluate one pipeline payload and print its completeness report.
    Evaluate {
        /// Payload JSON file, or `-` for stdin (the default).
        input: Option<PathBuf>,

        /// Assemble the payload from a directory of per-stage JSON files.
        #[arg(long, conflicts_with = "input")]
        run_dir: Option<PathBuf>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,

        /// Exit with an error when the pipeline is not complete.
        #[arg(long)]
        strict: bool,

        /// Skip warning-level checks.
        #[arg(long)]
        no_soft_checks: bool,

        /// Override the configured item key policy.
        #[arg(long, value_enum)]
        item_key: Option<ItemKeyArg>,
    },

    /// Print persona coverage metrics for a payload.
    Coverage {
        /// Payload JSON file, or `-` for stdin (the default).
        input: Option<PathBuf>,

        /// Assemble the payload from a directory of per-stage JSON files.
        #[arg(long, conflicts_with = "input")]
        run_dir: Option<PathBuf>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Print outreach sequence structure and channel-mix metrics.
    Outreach {
        /// Payload JSON file, or `-` for stdin (the default).
        input: Option<PathBuf>,

        /// Assemble the payload from a directory of per-stage JSON files.
        #[arg(long, conflicts_with = "input")]
        run_dir: Option<PathBuf>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Evaluate every run directory under a root.
    Batch {
        /// Root directory holding run directories.
        root: PathBuf,

        /// Write the summary here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "salescope=info,salescope_core=info,salescope_shared=info",
        1 => "salescope=debug,salescope_core=debug,salescope_shared=debug",
        _ => "salescope=trace,salescope_core=trace,salescope_shared=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Evaluate {
            input,
            run_dir,
            compact,
            strict,
            no_soft_checks,
            item_key,
        } => {
            let config = load_config()?;
            let mut options = EvaluationOptions::from(&config);
            if no_soft_checks {
                options.soft_checks = false;
            }
            if let Some(item_key) = item_key {
                options.item_key = item_key.into();
            }
            let source = Source::new(input, run_dir);
            cmd_evaluate(&source, &options, pretty(&config, compact), strict)
        }
        Command::Coverage {
            input,
            run_dir,
            compact,
        } => {
            let config = load_config()?;
            cmd_coverage(&Source::new(input, run_dir), pretty(&config, compact))
        }
        Command::Outreach {
            input,
            run_dir,
            compact,
        } => {
            let config = load_config()?;
            cmd_outreach(&Source::new(input, run_dir), pretty(&config, compact))
        }
        Command::Batch { root, out, compact } => {
            let config = load_config()?;
            let options = EvaluationOptions::from(&config);
            cmd_batch(&root, out.as_deref(), &options, pretty(&config, compact))
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn pretty(config: &AppConfig, compact: bool) -> bool {
    config.output.pretty && !compact
}

// ---------------------------------------------------------------------------
// Payload input
// ---------------------------------------------------------------------------

/// Where a payload comes from.
enum Source {
    Stdin,
    File(PathBuf),
    RunDir(PathBuf),
}

impl Source {
    fn new(input: Option<PathBuf>, run_dir: Option<PathBuf>) -> Self {
        match (input, run_dir) {
            (_, Some(dir)) => Source::RunDir(dir),
            (Some(path), None) if path.as_os_str() != "-" => Source::File(path),
            _ => Source::Stdin,
        }
    }

    /// Read and parse the payload, returning it with the digest of its bytes.
    fn load(&self) -> Result<(Value, String)> {
        let raw = match self {
            Source::RunDir(dir) => {
                let run = load_run_dir(dir)?;
                let bytes = serde_json::to_vec(&run.payload)?;
                return Ok((run.payload, payload_digest(&bytes)));
            }
            Source::File(path) => {
                std::fs::read_to_string(path).map_err(|e| SalescopeError::io(path, e))?
            }
            Source::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| SalescopeError::io("<stdin>", e))?;
                buf
            }
        };
        let payload: Value =
            serde_json::from_str(&raw).map_err(|e| SalescopeError::parse(e.to_string()))?;
        Ok((payload, payload_digest(raw.as_bytes())))
    }

    fn describe(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".to_string(),
            Source::File(path) | Source::RunDir(path) => path.display().to_string(),
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_evaluate(
    source: &Source,
    options: &EvaluationOptions,
    pretty: bool,
    strict: bool,
) -> Result<()> {
    let (payload, digest) = source.load()?;
    info!(source = %source.describe(), sha256 = %digest, "evaluating payload");

    let report = evaluate_completeness_with(&payload, options)?;
    print_json(&report, pretty)?;

    if strict && !report.is_complete {
        return Err(eyre!(
            "pipeline is incomplete (score_required_only = {}, {} issues)",
            report.score_required_only,
            report.issue_count()
        ));
    }
    Ok(())
}

fn cmd_coverage(source: &Source, pretty: bool) -> Result<()> {
    let (payload, digest) = source.load()?;
    info!(source = %source.describe(), sha256 = %digest, "assessing persona coverage");

    let coverage = coverage_from_payload(&payload)?;
    print_json(&coverage, pretty)
}

fn cmd_outreach(source: &Source, pretty: bool) -> Result<()> {
    let (payload, digest) = source.load()?;
    info!(source = %source.describe(), sha256 = %digest, "scoring outreach sequences");

    let metrics = outreach_from_payload(&payload)?;
    print_json(&metrics, pretty)
}

fn cmd_batch(
    root: &Path,
    out: Option<&Path>,
    options: &EvaluationOptions,
    pretty: bool,
) -> Result<()> {
    let reporter = CliProgress::new();
    let summary = evaluate_runs(root, options, &reporter)?;

    match out {
        Some(path) => {
            let json = serde_json::to_string_pretty(&summary)?;
            std::fs::write(path, json).map_err(|e| SalescopeError::io(path, e))?;
            info!(path = %path.display(), "batch summary written");
        }
        None => print_json(&summary, pretty)?,
    }

    eprintln!(
        "  {} runs, {} complete, {} failed ({:.1}s)",
        summary.total_runs,
        summary.complete_runs,
        summary.failed_runs,
        summary.elapsed_ms as f64 / 1000.0
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Batch progress bar drawn on stderr.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("evaluating runs");
    }

    fn run_finished(&self, run: &RunSummary, current: usize, _total: usize) {
        let status = match (run.is_complete, &run.error) {
            (_, Some(_)) => "failed",
            (Some(true), _) => "complete",
            _ => "incomplete",
        };
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("{} ({status})", run.name));
    }

    fn done(&self, _summary: &BatchSummary) {
        self.bar.finish_and_clear();
    }
}
