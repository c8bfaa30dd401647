//! Castellan CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use castellan::cli::commands::{config as config_command, simulate};
use castellan::cli::{Cli, Commands};
use castellan::infrastructure::config::ConfigLoader;
use castellan::infrastructure::logging::LoggerImpl;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        castellan::cli::handle_error(&err, cli.json);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    match &cli.command {
        Commands::Simulate(args) => simulate::execute(args, &config, cli.json),
        Commands::Config(args) => config_command::execute(args, &config, cli.json),
    }
}
