//! Orderdesk CLI — order document ingestion and template autofill.
//!
//! Parses order documents into a combined export, a plain-text summary,
//! and an autofilled template artifact with resolution diagnostics.

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
