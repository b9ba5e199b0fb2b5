use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use review_merge::config::MergeConfig;
use review_merge::{MergeEngine, Result, telemetry};
use tracing::error;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(kind = ?err.kind(), "{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
        Command::Validate(args) => execute_validate(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    telemetry::init_logging(args.common.log_dir.as_deref())?;

    let mut config = args.common.load_config()?;
    if let Some(marker) = args.marker {
        config.marker = marker;
    }
    let engine = MergeEngine::new(config);

    let destination = match args.output {
        Some(path) => path,
        None => {
            let name = engine.default_output_name(chrono::Local::now().naive_local());
            args.output_dir.unwrap_or_else(|| PathBuf::from(".")).join(name)
        }
    };

    let table = engine.run(&args.common.inputs, &destination)?;
    println!(
        "wrote {} ({} items, {} columns)",
        destination.display(),
        table.rows.len(),
        table.columns.len()
    );
    Ok(())
}

fn execute_validate(args: CommonArgs) -> Result<()> {
    telemetry::init_logging(args.log_dir.as_deref())?;

    let engine = MergeEngine::new(args.load_config()?);
    engine.validate(&args.inputs)?;
    println!("ok: {} workbook(s) carry the required columns", args.inputs.len());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MergeConfig> {
    match path {
        Some(path) => MergeConfig::from_json_file(path),
        None => Ok(MergeConfig::default()),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge reviewer-annotated workbooks into one summary workbook."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge the review workbooks and save the summary.
    Merge(MergeArgs),
    /// Only check that every workbook carries the required columns.
    Validate(CommonArgs),
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Review workbooks. The first one decides which items are summarised.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file overriding column names, marker, sheet name or file prefix.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to a dated file in this directory instead of stderr.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl CommonArgs {
    fn load_config(&self) -> Result<MergeConfig> {
        load_config(self.config.as_deref())
    }
}

#[derive(clap::Args)]
struct MergeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Summary workbook path.
    #[arg(long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Directory for a summary named after the current time.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Prefix for every consolidated opinion line.
    #[arg(long)]
    marker: Option<String>,
}
