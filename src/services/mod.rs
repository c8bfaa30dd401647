//! Scheduling services: generation, capability lookup and assignment.

pub mod capability_index;
pub mod priority_calculator;
pub mod task_generator;
pub mod task_scheduler;

pub use capability_index::CapabilityIndex;
pub use priority_calculator::PriorityCalculator;
pub use task_generator::TaskGenerator;
pub use task_scheduler::{
    Assignment, AssignmentOutcome, PassReport, Preemption, PreemptionOutcome, RejectionReason,
    Scheduler, SchedulerStatistics, SnapshotUpdate,
};
