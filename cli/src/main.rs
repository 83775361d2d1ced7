use std::path::PathBuf;

use anyhow::Result;
use breadmake_core::{load_config, logging, Dispatcher, DryRunner, Executor, DEFAULT_BREADFILE};
use clap::{ArgAction, Parser};

const PROGRAM: &str = "breadmake";

/// Run named targets declared in a Breadfile.
#[derive(Debug, Parser)]
#[command(name = "breadmake", version, about = "Run named targets declared in a Breadfile")]
struct Cli {
    /// Path to the Breadfile.
    #[arg(short, long, env = "BREADMAKE_FILE", default_value = DEFAULT_BREADFILE)]
    file: PathBuf,
    /// Print commands instead of running them.
    #[arg(long)]
    dry_run: bool,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Target to run; the default target when omitted.
    #[arg(value_name = "TARGET")]
    targets: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = load_config(&cli.file)?;
    let registry = config.build_registry()?;
    let executor = if cli.dry_run {
        Executor::new(DryRunner::new())
    } else {
        Executor::new(config.runner())
    };

    Dispatcher::new(&registry, &executor, PROGRAM).compile(&cli.targets)
}
