//! Domain models.

pub mod config;
pub mod faction;
pub mod queue;
pub mod task;

pub use config::{Config, GeneratorConfig, LogFormat, LoggingConfig, RotationPolicy, SchedulerConfig};
pub use faction::{CriticalNeed, FactionId, FactionState, ResourceKind, ResourcePool};
pub use queue::{HeapEntry, Keyed, Popped, PriorityHeap};
pub use task::{
    Location, Reward, Task, TaskDuration, TaskId, TaskType, UpfrontCost, WorkerId, MAX_PRIORITY,
    MIN_PRIORITY,
};
