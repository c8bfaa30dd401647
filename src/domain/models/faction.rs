//! Faction snapshots, live resource pools and need classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::task::{Reward, TaskType, UpfrontCost};

/// Gold below this is a gold-critical shortage.
pub const GOLD_CRITICAL_THRESHOLD: u64 = 1000;

/// Food below this is a food-critical shortage.
pub const FOOD_CRITICAL_THRESHOLD: u64 = 500;

/// Soldiers below this is a soldiers-critical shortage.
pub const SOLDIERS_CRITICAL_THRESHOLD: u64 = 5000;

/// Name of a competing house.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub String);

impl FactionId {
    /// The house name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactionId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FactionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single most urgent shortage of a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalNeed {
    /// Gold below the gold threshold
    Gold,
    /// Food below the food threshold
    Food,
    /// Too few soldiers
    Soldiers,
    /// At least one structure awaits repair
    Construction,
    /// No shortage
    Normal,
}

impl CriticalNeed {
    /// Task types that relieve this need. Empty for [`CriticalNeed::Normal`].
    pub const fn eligible_task_types(&self) -> &'static [TaskType] {
        match self {
            Self::Gold => &[TaskType::Mining, TaskType::Commerce],
            Self::Food => &[TaskType::Agriculture, TaskType::Hunting, TaskType::Fishing],
            Self::Soldiers => &[TaskType::Training, TaskType::Smithing],
            Self::Construction => &[TaskType::Construction, TaskType::Carpentry],
            Self::Normal => &[],
        }
    }

    /// `true` if `task_type` is in this need's eligible set.
    pub fn is_relieved_by(&self, task_type: TaskType) -> bool {
        self.eligible_task_types().contains(&task_type)
    }

    /// `true` for every need except [`CriticalNeed::Normal`].
    pub const fn is_critical(&self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Stable snake_case label used in logs and tables.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold_critical",
            Self::Food => "food_critical",
            Self::Soldiers => "soldiers_critical",
            Self::Construction => "construction_critical",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for CriticalNeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tick snapshot the simulation reports for one faction.
///
/// Replaced wholesale every tick; the scheduler never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionState {
    /// House the snapshot describes
    pub faction: FactionId,
    /// Gold in the treasury
    pub gold: u64,
    /// Food in the stores
    pub food: u64,
    /// Soldier count
    pub soldiers: u64,
    /// Structures awaiting repair
    pub damaged_structures: u32,
    /// Workers currently bound to a task
    pub active_workers: u32,
    /// Workers waiting for work; drives generation
    pub idle_workers: u32,
}

impl FactionState {
    /// Classifies the most critical need. First match wins, in the order
    /// gold, food, soldiers, damaged structures.
    pub const fn critical_need(&self) -> CriticalNeed {
        if self.gold < GOLD_CRITICAL_THRESHOLD {
            CriticalNeed::Gold
        } else if self.food < FOOD_CRITICAL_THRESHOLD {
            CriticalNeed::Food
        } else if self.soldiers < SOLDIERS_CRITICAL_THRESHOLD {
            CriticalNeed::Soldiers
        } else if self.damaged_structures > 0 {
            CriticalNeed::Construction
        } else {
            CriticalNeed::Normal
        }
    }
}

/// Resource kinds a task can cost or pay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Treasury gold
    Gold,
    /// Stored food
    Food,
    /// Stored wood
    Wood,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gold => "gold",
            Self::Food => "food",
            Self::Wood => "wood",
        })
    }
}

/// A faction's live stockpile, mutated by cost deduction and reward payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Treasury gold
    pub gold: u64,
    /// Stored food
    pub food: u64,
    /// Stored wood
    pub wood: u64,
}

impl ResourcePool {
    /// Creates a pool holding the given amounts.
    pub const fn new(gold: u64, food: u64, wood: u64) -> Self {
        Self { gold, food, wood }
    }

    /// Amount held of `kind`.
    pub const fn amount(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Gold => self.gold,
            ResourceKind::Food => self.food,
            ResourceKind::Wood => self.wood,
        }
    }

    /// First resource in `cost` the pool cannot cover, as `(kind, required, available)`.
    ///
    /// Wood is checked before food. Zero-cost components always pass.
    pub fn shortfall(&self, cost: &UpfrontCost) -> Option<(ResourceKind, u64, u64)> {
        [(ResourceKind::Wood, cost.wood), (ResourceKind::Food, cost.food)]
            .into_iter()
            .filter(|&(_, required)| required > 0)
            .find_map(|(kind, required)| {
                let available = self.amount(kind);
                (available < required).then_some((kind, required, available))
            })
    }

    /// Removes `cost`, saturating at zero.
    pub fn deduct(&mut self, cost: &UpfrontCost) {
        self.wood = self.wood.saturating_sub(cost.wood);
        self.food = self.food.saturating_sub(cost.food);
    }

    /// Adds the resource part of `reward`.
    pub fn credit(&mut self, reward: &Reward) {
        self.gold = self.gold.saturating_add(reward.gold);
        self.food = self.food.saturating_add(reward.food);
        self.wood = self.wood.saturating_add(reward.wood);
    }

    /// `true` when wood or food is below `threshold`.
    pub const fn is_low(&self, threshold: u64) -> bool {
        self.wood < threshold || self.food < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(gold: u64, food: u64, soldiers: u64, damaged: u32) -> FactionState {
        FactionState {
            faction: FactionId::from("lannister"),
            gold,
            food,
            soldiers,
            damaged_structures: damaged,
            active_workers: 0,
            idle_workers: 3,
        }
    }

    #[test]
    fn test_need_chain_order() {
        assert_eq!(snapshot(500, 100, 0, 3).critical_need(), CriticalNeed::Gold);
        assert_eq!(snapshot(1000, 100, 0, 3).critical_need(), CriticalNeed::Food);
        assert_eq!(snapshot(1000, 500, 10, 3).critical_need(), CriticalNeed::Soldiers);
        assert_eq!(
            snapshot(1000, 500, 5000, 3).critical_need(),
            CriticalNeed::Construction
        );
        assert_eq!(snapshot(1000, 500, 5000, 0).critical_need(), CriticalNeed::Normal);
    }

    #[test]
    fn test_eligible_sets() {
        assert_eq!(
            CriticalNeed::Gold.eligible_task_types(),
            &[TaskType::Mining, TaskType::Commerce]
        );
        assert!(CriticalNeed::Food.is_relieved_by(TaskType::Fishing));
        assert!(!CriticalNeed::Food.is_relieved_by(TaskType::Mining));
        assert!(CriticalNeed::Normal.eligible_task_types().is_empty());
        assert!(!CriticalNeed::Normal.is_critical());
    }

    #[test]
    fn test_shortfall_checks_only_nonzero_costs() {
        let pool = ResourcePool::new(0, 0, 0);
        assert_eq!(pool.shortfall(&UpfrontCost::default()), None);

        let pool = ResourcePool::new(0, 300, 50);
        let cost = UpfrontCost { wood: 200, food: 0 };
        assert_eq!(pool.shortfall(&cost), Some((ResourceKind::Wood, 200, 50)));

        let cost = UpfrontCost { wood: 40, food: 400 };
        assert_eq!(pool.shortfall(&cost), Some((ResourceKind::Food, 400, 300)));
    }

    #[test]
    fn test_deduct_and_credit() {
        let mut pool = ResourcePool::new(10, 100, 100);
        pool.deduct(&UpfrontCost { wood: 30, food: 20 });
        assert_eq!(pool, ResourcePool::new(10, 80, 70));

        pool.credit(&Reward {
            gold: 5,
            food: 1,
            wood: 2,
            experience: 99,
        });
        assert_eq!(pool, ResourcePool::new(15, 81, 72));
    }
}
