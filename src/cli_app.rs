//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::Parser;

use liftsim::core::config::Config;
use liftsim::core::errors::Result;
use liftsim::core::shutdown::ShutdownFlag;
use liftsim::logger::ActivityLogger;
use liftsim::supervisor::run_system;

/// liftsim — a multi-elevator dispatcher simulator.
#[derive(Debug, Parser)]
#[command(name = "liftsim", author, version, about = "Multi-elevator dispatcher simulator", long_about = None)]
pub struct Cli {
    /// Scripted input file (see the input file format in the docs).
    pub input_file: PathBuf,
    /// Number of elevator cars to simulate.
    #[arg(long, value_name = "N")]
    pub cars: Option<u32>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Write the JSONL activity log to this path instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub json_log: Option<PathBuf>,
    /// Also mirror activity events to stdout.
    #[arg(long)]
    pub verbose: bool,
}

/// Run the CLI's one subcommand: parse config, spawn the system, wait for
/// completion or a shutdown signal, and report a summary.
pub fn run(args: &Cli) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(cars) = args.cars {
        config.fleet.num_elevators = cars;
    }
    config.validate()?;

    let (logger, logger_handle) = ActivityLogger::spawn(args.json_log.clone(), args.verbose)?;
    let shutdown = ShutdownFlag::new();

    let summary = run_system(&config, &args.input_file, logger.clone(), shutdown)?;
    drop(logger);
    let _ = logger_handle.join();

    println!(
        "liftsim: {}/{} requests completed",
        summary.completed, summary.total_injected
    );
    Ok(())
}
