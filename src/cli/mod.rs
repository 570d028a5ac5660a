//! Command-line interface for forecast-launch
//!
//! Wires the argument surface to run-context assembly, staging, rendering,
//! and the model launch.

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::context::{RunContext, Sources};
use crate::cycle::Cycle;
use crate::launch;

/// Prepare and launch one forecast cycle
#[derive(Parser)]
#[command(name = "forecast-launch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Full path to a YAML user config file
    #[arg(short = 'c', long = "user_config", value_name = "PATH")]
    user_config: PathBuf,

    /// The forecast start time in YYYYMMDDHH[MM[SS]] format
    #[arg(short = 'd', long = "start_date", value_name = "DATE")]
    start_date: String,

    /// YAML grids config file and the grid section to use
    #[arg(short = 'g', long = "grid_config", num_args = 2, value_names = ["PATH", "SECTION"])]
    grid_config: Option<Vec<String>>,

    /// YAML machines config file and the machine to use: hera, wcoss, jet
    #[arg(short = 'm', long = "machine_config", num_args = 2, value_names = ["PATH", "SECTION"])]
    machine_config: Option<Vec<String>>,

    /// YAML namelist config file and the physics package section to use
    #[arg(short = 'n', long = "nml_config", num_args = 2, value_names = ["PATH", "SECTION"])]
    nml_config: Option<Vec<String>>,

    /// YAML script settings file, overriding the default location
    #[arg(short = 's', long = "script_config", value_name = "PATH")]
    script_config: Option<PathBuf>,

    /// Overwrite an existing working directory instead of exiting
    #[arg(long)]
    overwrite: bool,

    /// Set up the run directory, but don't run the executable
    #[arg(long)]
    dry_run: bool,

    /// Suppress per-key merge audit output
    #[arg(long)]
    quiet: bool,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    // The cycle is validated before any file I/O.
    let cycle = Cycle::parse(&cli.start_date)?;

    let sources = Sources {
        user_config: cli.user_config.clone(),
        script_config: cli.script_config.clone(),
        grid_config: section_pair(cli.grid_config.as_deref()),
        machine_config: section_pair(cli.machine_config.as_deref()),
        nml_config: section_pair(cli.nml_config.as_deref()),
    };

    let mut ctx = RunContext::assemble(&sources, cycle, cli.quiet)?;
    ctx.validate()?;
    ctx.create_workdir(cli.overwrite)?;

    let staged = ctx.prepare()?;
    println!(
        "{} cycle {} in {} ({staged} files staged)",
        style("prepared").green().bold(),
        ctx.cycle.token(),
        ctx.workdir.display(),
    );

    if cli.dry_run {
        println!("{} skipping model launch", style("dry run:").yellow());
        return Ok(());
    }

    launch::launch(&ctx)
}

/// Convert a clap `num_args = 2` pair into a (path, section) tuple.
fn section_pair(pair: Option<&[String]>) -> Option<(PathBuf, String)> {
    pair.map(|parts| (PathBuf::from(&parts[0]), parts[1].clone()))
}
