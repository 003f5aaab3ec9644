//! Command-line interface definitions.
//!
//! Defines the CLI structure for spreadwatch using `clap`: running the
//! monitor, diagnostic checks, and inspecting the store's blacklist.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::BlacklistWindow;

/// Spot/perpetual-futures spread monitor
#[derive(Parser, Debug)]
#[command(name = "spreadwatch")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream quotes, track spreads and sync them to the store (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Show the blacklist held by the store and the configured manual pairs
    Blacklist(BlacklistArgs),
}

/// Subcommands for `spreadwatch check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and report health checks.
    Config(ConfigPathArg),
    /// Send a health-check action to the store.
    Store(ConfigPathArg),
}

/// Shared argument for commands that only need a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,

    /// Comma-separated pairs replacing the configured list.
    #[arg(long)]
    pub pairs: Option<String>,

    /// Seconds between batches sent to the store.
    #[arg(long)]
    pub sync_interval: Option<u64>,

    /// Print the best opportunities every N seconds (0 disables).
    #[arg(long, default_value = "0")]
    pub report_interval: u64,

    /// Rows in each opportunity report.
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Blacklist window used in reports.
    #[arg(long, value_parser = parse_window)]
    pub window: Option<BlacklistWindow>,
}

/// Arguments for the `blacklist` subcommand.
#[derive(Parser, Debug)]
pub struct BlacklistArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

fn parse_window(raw: &str) -> Result<BlacklistWindow, String> {
    raw.parse()
}
