//! Need-driven task priorities.

use crate::domain::models::{CriticalNeed, TaskType, MAX_PRIORITY, MIN_PRIORITY};

/// Service for calculating need-driven task priorities
///
/// Priority formula: base_priority(type) + need_boost, capped at 10, where
/// the boost applies only when the type relieves the faction's current need.
#[derive(Debug, Clone)]
pub struct PriorityCalculator {
    need_boost: u8,
    ceiling: u8,
}

impl Default for PriorityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityCalculator {
    /// Create a new priority calculator with the default +3 boost
    pub const fn new() -> Self {
        Self {
            need_boost: 3,
            ceiling: MAX_PRIORITY,
        }
    }

    /// Create a priority calculator with a custom boost
    pub fn with_boost(need_boost: u8) -> Self {
        Self {
            need_boost,
            ceiling: MAX_PRIORITY,
        }
    }

    /// Calculate the priority for a task type under the given need
    ///
    /// # Arguments
    /// * `task_type` - The type being generated
    /// * `need` - The owning faction's current critical need
    ///
    /// # Returns
    /// A priority in 1..=10
    pub fn calculate(&self, task_type: TaskType, need: CriticalNeed) -> u8 {
        let base = task_type.base_priority();
        let boost = if need.is_relieved_by(task_type) {
            self.need_boost
        } else {
            0
        };

        base.saturating_add(boost).clamp(MIN_PRIORITY, self.ceiling)
    }
}
