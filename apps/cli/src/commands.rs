//! CLI definition, tracing setup, and command dispatch.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use orderdesk_autofill::{SheetWriter, ensure_initialized};
use orderdesk_core::pipeline::{
    self, OutputSelection, ProgressReporter, RunConfig, RunResult,
};
use orderdesk_extract::TaggedTextExtractor;
use orderdesk_shared::{OrderdeskError, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Orderdesk — turn order documents into exports and autofilled sheets.
#[derive(Parser)]
#[command(
    name = "orderdesk",
    version,
    about = "Parse order documents into a combined export, a summary, and an autofilled template.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Order document file or a directory of order documents.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Template descriptor path (default: <templates_dir>/standard.json).
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Output directory (default: from config, ./output).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write the filled sheet artifact (plus resolution diagnostics).
    #[arg(long)]
    pub sheet: bool,

    /// Write the combined JSON export.
    #[arg(long)]
    pub json: bool,

    /// Write the plain-text summary.
    #[arg(long)]
    pub txt: bool,

    /// Config file path (default: ./orderdesk.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "orderdesk=info",
        1 => "orderdesk=debug",
        _ => "orderdesk=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let outputs = OutputSelection {
        json: cli.json,
        txt: cli.txt,
        sheet: cli.sheet,
    };

    if !outputs.any() {
        println!("Nothing to do. Specify at least one of --sheet, --json, --txt.");
        return Ok(());
    }

    // Startup bootstrap: create the autofill config layout once and get
    // the resolved handles.
    let autofill = ensure_initialized(Path::new(&config.paths.config_dir))?;

    let run_config = RunConfig {
        input: cli.input,
        template_path: cli
            .template
            .unwrap_or_else(|| config.default_template_path()),
        output_root: cli
            .out
            .unwrap_or_else(|| PathBuf::from(&config.paths.output_dir)),
        extensions: config.input.extensions.clone(),
        outputs,
        autofill,
    };

    info!(
        input = %run_config.input.display(),
        template = %run_config.template_path.display(),
        "starting run"
    );

    let reporter = CliProgress::new();
    let result = match pipeline::run(
        &run_config,
        &TaggedTextExtractor::new(),
        &SheetWriter::new(),
        &reporter,
    ) {
        Ok(result) => result,
        Err(OrderdeskError::InputNotFound { path }) => {
            reporter.clear();
            eprintln!("No eligible order documents found at '{}'.", path.display());
            std::process::exit(2);
        }
        Err(e) => {
            reporter.clear();
            return Err(e.into());
        }
    };

    // Print summary
    println!();
    println!("  Run complete!");
    println!("  Documents: {}", result.document_count);
    println!("  People:    {}", result.person_count);
    println!("  Records:   {}", result.record_count);
    if let Some(unresolved) = result.diagnostics_count {
        println!("  Unresolved slots: {unresolved}");
    }
    for path in &result.artifacts {
        println!("  Wrote:     {}", path.display());
    }
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
