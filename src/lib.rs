//! Castellan - need-driven task scheduling for competing houses
//!
//! Castellan generates work for pools of interchangeable workers, ranks it by
//! each house's most critical shortage, and admits it only when the house can
//! pay the upfront cost.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): tasks, faction snapshots, the priority heap
//! - **Service Layer** (`services`): generator, capability index, scheduler
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **Application Layer** (`application`): a deterministic demo world
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use castellan::{Config, FactionId, FactionState, ResourcePool, Scheduler, WorkerId};
//!
//! let mut scheduler = Scheduler::from_config(&Config::default());
//! let stark = FactionId::from("stark");
//! scheduler.update_faction_state(FactionState {
//!     faction: stark.clone(),
//!     gold: 500,
//!     food: 2000,
//!     soldiers: 6000,
//!     damaged_structures: 0,
//!     active_workers: 0,
//!     idle_workers: 2,
//! });
//!
//! let mut ledger = HashMap::from([(stark.clone(), ResourcePool::new(500, 2000, 400))]);
//! let report = scheduler.run_assignment_pass(&[WorkerId(1), WorkerId(2)], &stark, &mut ledger);
//! assert_eq!(report.bound_count(), 2);
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, CriticalNeed, FactionId, FactionState, PriorityHeap, ResourcePool, Task, TaskId,
    TaskType, WorkerId,
};
pub use domain::ports::FactionLedger;
pub use domain::TaskError;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PassReport, Scheduler, SchedulerStatistics};
