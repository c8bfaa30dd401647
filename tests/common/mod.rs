//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::collections::HashMap;

use castellan::domain::models::{
    FactionId, FactionState, GeneratorConfig, ResourcePool, SchedulerConfig,
};
use castellan::services::{Scheduler, TaskGenerator};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[allow(dead_code)]
pub fn faction() -> FactionId {
    FactionId::from("lannister")
}

/// Ledger tracking only [`faction`], with plenty of gold
#[allow(dead_code)]
pub fn ledger(food: u64, wood: u64) -> HashMap<FactionId, ResourcePool> {
    HashMap::from([(faction(), ResourcePool::new(10_000, food, wood))])
}

/// Snapshot of [`faction`] with no critical need
#[allow(dead_code)]
pub fn calm_snapshot(idle_workers: u32) -> FactionState {
    FactionState {
        faction: faction(),
        gold: 10_000,
        food: 10_000,
        soldiers: 10_000,
        damaged_structures: 0,
        active_workers: 0,
        idle_workers,
    }
}

/// Scheduler whose assignment passes never generate tasks themselves
#[allow(dead_code)]
pub fn manual_scheduler(seed: u64) -> Scheduler {
    let generator = GeneratorConfig {
        forced_batch_limit: 0,
        ..GeneratorConfig::default()
    };
    Scheduler::new(SchedulerConfig::default(), TaskGenerator::new(generator, seed))
}
