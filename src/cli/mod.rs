//! CLI interface for statarb-sim
//!
//! Provides subcommands for:
//! - `backtest`: Run a simulation from a scenario file
//! - `config`: Show the effective configuration

mod backtest;

pub use backtest::BacktestArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "statarb-sim")]
#[command(about = "Portfolio simulation and metrics engine for stat-arb strategies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulation from a scenario file
    Backtest(BacktestArgs),
    /// Show the effective configuration
    Config,
}
