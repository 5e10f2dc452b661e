use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tesser_config::{load_config, parse_inline_spec, EngineConfig};
use tesser_indicators::{FunctionRegistry, FunctionSpec};
use tracing::{info, warn};

use crate::bars::load_csv;
use crate::output::{render, FunctionReport, OutputFormat};
use crate::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Inspect incremental indicator functions over bar data")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured log filter
    #[arg(long, global = true)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute functions over a CSV of bars and print their trailing rows
    Inspect(InspectArgs),
    /// List supported function kinds
    Kinds,
}

#[derive(Args)]
struct InspectArgs {
    /// CSV file with `timestamp,open,high,low,close,volume` columns
    #[arg(long)]
    bars: PathBuf,
    /// Extra function as a TOML inline table, e.g. `{ kind = "rsi", period = 14 }`
    #[arg(long = "function", value_name = "SPEC")]
    functions: Vec<String>,
    /// Number of trailing rows to print
    #[arg(long, default_value_t = 5)]
    last: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(filter) = cli.log_filter {
        config.logging.filter = filter;
    }
    telemetry::init(&config.logging)?;

    match cli.command {
        Command::Inspect(args) => inspect(args, &config),
        Command::Kinds => {
            for kind in FunctionSpec::KINDS {
                println!("{kind}");
            }
            Ok(())
        }
    }
}

fn inspect(args: InspectArgs, config: &EngineConfig) -> Result<()> {
    let mut specs = config.functions.clone();
    for raw in &args.functions {
        specs.push(parse_inline_spec(raw)?);
    }
    if specs.is_empty() {
        bail!("no functions to compute; pass --function or list them in --config");
    }

    let series = Arc::new(load_csv(&args.bars)?);
    let session = series.session();
    let registry = FunctionRegistry::new();
    let mut handles = Vec::with_capacity(specs.len());
    let mut reports = Vec::with_capacity(specs.len());
    for spec in specs {
        let handle = match registry.get_instance(&series, spec) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(function = %spec, error = %err, "function unavailable");
                continue;
            }
        };
        handle.compute_to_end(session);
        reports.push(FunctionReport::collect(&handle, &series, args.last));
        handles.push(handle);
    }
    info!(
        functions = reports.len(),
        instances = registry.live_count(&series),
        "computed functions"
    );
    render(&reports, args.format, &mut io::stdout().lock())
}
