//! Implementation of the `castellan simulate` command.

use anyhow::Result;
use clap::Args;

use crate::application::{Simulation, SimulationReport, SimulationSettings, HOUSE_NAMES};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::Config;

/// Arguments of `castellan simulate`
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of weekly ticks to run
    #[arg(short, long, default_value = "12")]
    pub weeks: u32,

    /// Seed overriding the configured one
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of competing houses
    #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u8).range(1..=HOUSE_NAMES.len() as i64))]
    pub factions: u8,

    /// Workers per house
    #[arg(short = 'W', long, default_value = "8")]
    pub workers: u32,

    /// Also print the week-by-week activity table
    #[arg(short, long)]
    pub timeline: bool,
}

/// Output of `castellan simulate`
#[derive(Debug, serde::Serialize)]
pub struct SimulateOutput {
    /// Full simulation report
    #[serde(flatten)]
    pub report: SimulationReport,
    /// Print the week-by-week table in human mode
    #[serde(skip)]
    pub show_timeline: bool,
}

impl CommandOutput for SimulateOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let completed: usize = self.report.houses.iter().map(|h| h.tasks_completed).sum();

        let mut lines = vec![format!(
            "Simulated {} week(s) for {} house(s) with seed {}; {} task(s) completed\n",
            self.report.weeks,
            self.report.houses.len(),
            self.report.seed,
            completed
        )];
        if self.show_timeline {
            lines.push(formatter.format_timeline(&self.report.timeline));
        }
        lines.push(formatter.format_houses(&self.report.houses));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run the demo world and print its report
pub fn execute(args: &SimulateArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let settings = SimulationSettings {
        weeks: args.weeks,
        factions: usize::from(args.factions),
        workers_per_faction: args.workers,
    };
    let report = Simulation::new(&config, &settings).run(settings.weeks);

    output(
        &SimulateOutput {
            report,
            show_timeline: args.timeline,
        },
        json_mode,
    );
    Ok(())
}
