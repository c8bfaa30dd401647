//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::config::ConfigArgs;
use super::commands::simulate::SimulateArgs;

#[derive(Parser, Debug)]
#[command(name = "castellan")]
#[command(about = "Castellan - need-driven task scheduler for competing houses", long_about = None)]
#[command(version)]
/// Top-level command line
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .castellan/
    #[arg(short, long, global = true, env = "CASTELLAN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo world for a number of weeks
    Simulate(SimulateArgs),

    /// Configuration commands
    Config(ConfigArgs),
}
