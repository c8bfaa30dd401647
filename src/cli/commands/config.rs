//! Implementation of the `castellan config` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

/// Arguments of `castellan config`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration after merging files and environment
    Show,
}

/// Output of `castellan config show`
#[derive(Debug, serde::Serialize)]
pub struct ConfigOutput {
    /// Effective configuration
    #[serde(flatten)]
    pub config: Config,
    #[serde(skip)]
    yaml: String,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        self.yaml.trim_end().to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Execute a config subcommand
pub fn execute(args: &ConfigArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
            output(
                &ConfigOutput {
                    config: config.clone(),
                    yaml,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
