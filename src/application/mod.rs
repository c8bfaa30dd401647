//! Application layer: the demo world that drives the scheduler.

pub mod simulation;

pub use simulation::{
    HouseSummary, Simulation, SimulationReport, SimulationSettings, WeekSummary, HOUSE_NAMES,
};
