//! Domain error types.

use thiserror::Error;

use super::models::task::TaskId;

/// Domain-level errors for task operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Priority outside 1..=10
    #[error("Invalid priority: {0} (must be 1-10)")]
    InvalidPriority(u8),

    /// No pending task has this id
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}
