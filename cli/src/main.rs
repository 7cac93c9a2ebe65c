//! wardenctl - operate a Warden treasury from the command line
//!
//! Each invocation is one transaction against the treasury snapshot in the
//! data directory. Results are printed as JSON on stdout; logs go to stderr.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use commands::Command;
use config::Config;

#[derive(Parser)]
#[command(name = "wardenctl")]
#[command(about = "Warden multisig treasury and staking CLI")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file and WARDEN_DATA_DIR)
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Transaction time in Unix milliseconds (defaults to now)
    #[arg(long, value_name = "MS", global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

fn wall_clock_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let now = cli.now.unwrap_or_else(wall_clock_ms);
    let output = commands::dispatch(&config, cli.command, now)?;
    println!("{}", output);
    Ok(())
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
