//! Task domain model.
//!
//! Tasks are units of work a faction hands to one idle worker. Their type
//! fixes base priority, duration, upfront cost ranges and completion rewards.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::faction::FactionId;
use super::queue::Keyed;
use crate::domain::error::TaskError;

/// Lowest task priority.
pub const MIN_PRIORITY: u8 = 1;

/// Highest (most urgent) task priority.
pub const MAX_PRIORITY: u8 = 10;

/// Identity of a task, unique within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Opaque worker identity supplied by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Opaque map position a task should be carried out at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

/// Profession or activity a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Digging for gold
    Mining,
    /// Working the fields
    Agriculture,
    /// Trading at market
    Commerce,
    /// Drilling new soldiers
    Training,
    /// Raising or repairing buildings
    Construction,
    /// Forging arms and tools
    Smithing,
    /// Woodwork for the holdfast
    Carpentry,
    /// Standing watch
    Guard,
    /// Hunting game
    Hunting,
    /// Fishing the rivers and coast
    Fishing,
    /// Brewing and distilling
    Alchemy,
    /// Learning at the maester's side
    Study,
    /// Making goods for sale
    Craftsmanship,
    /// Running the household
    Administration,
}

impl TaskType {
    /// Every task type, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Mining,
        Self::Agriculture,
        Self::Commerce,
        Self::Training,
        Self::Construction,
        Self::Smithing,
        Self::Carpentry,
        Self::Guard,
        Self::Hunting,
        Self::Fishing,
        Self::Alchemy,
        Self::Study,
        Self::Craftsmanship,
        Self::Administration,
    ];

    /// Producer types that never carry an upfront cost.
    pub const COST_FREE_PRODUCERS: [Self; 5] = [
        Self::Agriculture,
        Self::Commerce,
        Self::Guard,
        Self::Hunting,
        Self::Fishing,
    ];

    /// Lowercase name, also used as the capability tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mining => "mining",
            Self::Agriculture => "agriculture",
            Self::Commerce => "commerce",
            Self::Training => "training",
            Self::Construction => "construction",
            Self::Smithing => "smithing",
            Self::Carpentry => "carpentry",
            Self::Guard => "guard",
            Self::Hunting => "hunting",
            Self::Fishing => "fishing",
            Self::Alchemy => "alchemy",
            Self::Study => "study",
            Self::Craftsmanship => "craftsmanship",
            Self::Administration => "administration",
        }
    }

    /// Parses a name produced by [`as_str`](Self::as_str), ignoring case.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == s.to_lowercase())
    }

    /// Base priority before any need boost (1-9).
    pub const fn base_priority(&self) -> u8 {
        match self {
            Self::Construction => 9,
            Self::Agriculture | Self::Administration => 8,
            Self::Mining | Self::Commerce | Self::Smithing => 7,
            Self::Training | Self::Carpentry | Self::Hunting => 6,
            Self::Guard | Self::Fishing => 5,
            Self::Alchemy | Self::Craftsmanship => 4,
            Self::Study => 3,
        }
    }

    /// How long a task of this type runs.
    pub const fn duration(&self) -> TaskDuration {
        match self {
            Self::Hunting | Self::Fishing => TaskDuration::Weeks(1),
            Self::Agriculture | Self::Commerce | Self::Training | Self::Carpentry => {
                TaskDuration::Weeks(2)
            }
            Self::Mining | Self::Smithing | Self::Craftsmanship => TaskDuration::Weeks(3),
            Self::Construction | Self::Study => TaskDuration::Weeks(4),
            Self::Alchemy => TaskDuration::Weeks(5),
            Self::Guard | Self::Administration => TaskDuration::Continuous,
        }
    }

    /// Wood needed to start, as an inclusive range to draw from.
    pub const fn wood_cost_range(&self) -> Option<RangeInclusive<u64>> {
        match self {
            Self::Construction => Some(150..=300),
            Self::Carpentry => Some(50..=100),
            Self::Smithing => Some(20..=40),
            _ => None,
        }
    }

    /// Food needed to start (feeding the labourers).
    pub const fn food_cost_range(&self) -> Option<RangeInclusive<u64>> {
        match self {
            Self::Construction => Some(100..=200),
            Self::Mining => Some(50..=100),
            Self::Carpentry => Some(30..=60),
            Self::Training => Some(40..=80),
            _ => None,
        }
    }

    /// Resources granted on completion, experience excluded.
    pub const fn base_reward(&self) -> Reward {
        let (gold, food, wood) = match self {
            Self::Mining | Self::Smithing => (50, 0, 0),
            Self::Commerce => (80, 0, 0),
            Self::Carpentry => (40, 0, 15),
            Self::Craftsmanship => (30, 0, 0),
            Self::Construction => (100, 0, 10),
            Self::Agriculture => (0, 30, 0),
            Self::Hunting => (0, 25, 0),
            Self::Fishing => (0, 20, 0),
            Self::Training
            | Self::Guard
            | Self::Alchemy
            | Self::Study
            | Self::Administration => (0, 0, 0),
        };
        Reward {
            gold,
            food,
            wood,
            experience: 0,
        }
    }

    /// `true` if the type never costs wood or food to start.
    pub fn is_cost_free(&self) -> bool {
        self.wood_cost_range().is_none() && self.food_cost_range().is_none()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a task runs once bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDuration {
    /// Completes after this many weekly ticks of work
    Weeks(u32),
    /// Standing post that never completes on its own
    Continuous,
}

impl TaskDuration {
    /// `true` for [`TaskDuration::Continuous`].
    pub const fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous)
    }

    /// Progress earned by `weeks_elapsed` of work. Always 0 for continuous tasks.
    pub fn progress_for(&self, weeks_elapsed: f64) -> f64 {
        match self {
            Self::Weeks(0) => 1.0,
            Self::Weeks(weeks) => (weeks_elapsed / f64::from(*weeks)).max(0.0),
            Self::Continuous => 0.0,
        }
    }
}

impl fmt::Display for TaskDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weeks(weeks) => write!(f, "{weeks}w"),
            Self::Continuous => f.write_str("continuous"),
        }
    }
}

/// Resources deducted from the owning faction when the task is admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpfrontCost {
    /// Wood to deduct
    pub wood: u64,
    /// Food to deduct
    pub food: u64,
}

impl UpfrontCost {
    /// `true` if nothing is deducted.
    pub const fn is_free(&self) -> bool {
        self.wood == 0 && self.food == 0
    }
}

/// Deferred payout handed to the caller once a task completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Gold paid out
    pub gold: u64,
    /// Food paid out
    pub food: u64,
    /// Wood paid out
    pub wood: u64,
    /// Experience earned by the worker
    pub experience: u64,
}

impl Reward {
    /// Returns the reward with its experience replaced.
    pub const fn with_experience(mut self, experience: u64) -> Self {
        self.experience = experience;
        self
    }

    /// `true` if the reward grants any gold, food or wood.
    pub const fn yields_resources(&self) -> bool {
        self.gold > 0 || self.food > 0 || self.wood > 0
    }
}

/// A unit of schedulable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id within the scheduler
    pub id: TaskId,
    /// Creation order, used only to break priority ties
    pub sequence: u64,
    /// Profession the task belongs to
    pub task_type: TaskType,
    /// 1-10, 10 = most urgent
    pub priority: u8,
    /// Weeks of work, or a continuous post
    pub duration: TaskDuration,
    /// Worker the task is bound to, if any
    pub assigned_to: Option<WorkerId>,
    /// 0.0-1.0
    pub progress: f64,
    /// Set once the task has been reported complete
    pub completed: bool,
    /// Deducted from the owning faction on admission
    pub cost: UpfrontCost,
    /// Handed back to the caller on completion
    pub reward: Reward,
    /// Set once `cost` has been deducted; never cleared
    pub costs_consumed: bool,
    /// Owning faction, charged on admission
    pub faction: FactionId,
    /// Where the work happens; opaque to the scheduler
    pub location: Option<Location>,
}

impl Task {
    /// Creates an unbound task with the type's default duration and reward.
    pub fn new(
        id: TaskId,
        task_type: TaskType,
        priority: u8,
        faction: FactionId,
    ) -> Result<Self, TaskError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(TaskError::InvalidPriority(priority));
        }

        Ok(Self::clamped(id, task_type, priority, faction))
    }

    /// Like [`Task::new`], but clamps `priority` into 1..=10 instead of failing.
    pub fn clamped(id: TaskId, task_type: TaskType, priority: u8, faction: FactionId) -> Self {
        Self {
            id,
            sequence: id.0,
            task_type,
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            duration: task_type.duration(),
            assigned_to: None,
            progress: 0.0,
            completed: false,
            cost: UpfrontCost::default(),
            reward: task_type.base_reward(),
            costs_consumed: false,
            faction,
            location: None,
        }
    }

    /// Sets the upfront cost.
    pub fn with_cost(mut self, cost: UpfrontCost) -> Self {
        self.cost = cost;
        self
    }

    /// Sets the completion reward.
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }

    /// Sets the target location.
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Key the min-heap orders by: 0 for priority 10, 9 for priority 1.
    pub fn heap_priority(&self) -> i32 {
        i32::from(MAX_PRIORITY) - i32::from(self.priority)
    }

    /// `true` while a worker holds the task.
    pub const fn is_bound(&self) -> bool {
        self.assigned_to.is_some()
    }

    /// `true` if the task is a standing post.
    pub const fn is_continuous(&self) -> bool {
        self.duration.is_continuous()
    }

    /// Adds progress, clamped to 1.0. Continuous tasks do not accrue progress.
    ///
    /// Returns `true` once the task has reached full progress.
    pub fn advance(&mut self, increment: f64) -> bool {
        if self.is_continuous() {
            return false;
        }
        self.progress = (self.progress + increment.max(0.0)).min(1.0);
        self.progress >= 1.0
    }

    /// Marks the task finished and releases its worker binding.
    pub fn mark_completed(&mut self) {
        self.progress = 1.0;
        self.completed = true;
        self.assigned_to = None;
    }
}

impl Keyed for Task {
    type Key = TaskId;

    fn key(&self) -> Self::Key {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faction() -> FactionId {
        FactionId::from("stark")
    }

    #[test]
    fn test_new_rejects_out_of_range_priority() {
        assert!(matches!(
            Task::new(TaskId(1), TaskType::Mining, 0, faction()),
            Err(TaskError::InvalidPriority(0))
        ));
        assert!(matches!(
            Task::new(TaskId(1), TaskType::Mining, 11, faction()),
            Err(TaskError::InvalidPriority(11))
        ));
        assert!(Task::new(TaskId(1), TaskType::Mining, 10, faction()).is_ok());
    }

    #[test]
    fn test_new_uses_type_tables() {
        let task = Task::new(TaskId(7), TaskType::Construction, 9, faction()).unwrap();
        assert_eq!(task.sequence, 7);
        assert_eq!(task.duration, TaskDuration::Weeks(4));
        assert_eq!(task.reward.gold, 100);
        assert_eq!(task.reward.wood, 10);
        assert!(!task.is_bound());
        assert!(!task.costs_consumed);
    }

    #[test]
    fn test_heap_priority_inverts_urgency() {
        let urgent = Task::new(TaskId(1), TaskType::Mining, 10, faction()).unwrap();
        let idle = Task::new(TaskId(2), TaskType::Mining, 1, faction()).unwrap();
        assert_eq!(urgent.heap_priority(), 0);
        assert_eq!(idle.heap_priority(), 9);
    }

    #[test]
    fn test_base_priorities_stay_below_ten() {
        for task_type in TaskType::ALL {
            let base = task_type.base_priority();
            assert!((1..=9).contains(&base), "{task_type} has base {base}");
        }
    }

    #[test]
    fn test_cost_free_producers_have_no_cost() {
        for task_type in TaskType::COST_FREE_PRODUCERS {
            assert!(task_type.is_cost_free(), "{task_type} should be free");
        }
        assert!(!TaskType::Construction.is_cost_free());
        assert!(!TaskType::Mining.is_cost_free());
    }

    #[test]
    fn test_continuous_types() {
        assert!(TaskType::Guard.duration().is_continuous());
        assert!(TaskType::Administration.duration().is_continuous());
        assert!(!TaskType::Study.duration().is_continuous());
    }

    #[test]
    fn test_advance_clamps_and_reports_completion() {
        let mut task = Task::new(TaskId(1), TaskType::Hunting, 6, faction()).unwrap();
        assert!(!task.advance(0.6));
        assert!(task.advance(0.6));
        assert!((task.progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_continuous_task_never_progresses() {
        let mut task = Task::new(TaskId(1), TaskType::Guard, 5, faction()).unwrap();
        assert!(!task.advance(5.0));
        assert!(task.progress.abs() < f64::EPSILON);
        assert!(TaskDuration::Continuous.progress_for(100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_for_scales_with_duration() {
        let progress = TaskDuration::Weeks(4).progress_for(1.0);
        assert!((progress - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_str_round_trips_names() {
        assert_eq!(TaskType::from_str("Smithing"), Some(TaskType::Smithing));
        assert_eq!(TaskType::from_str("dragon-taming"), None);
    }
}
