//! Salescope CLI: completeness reports for sales-intelligence pipeline output.
//!
//! Validates generated products, buyer personas, pain-point mappings and
//! outreach sequences, and prints a JSON completeness report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
