//! Need-driven task generation.
//!
//! Classifies a faction's most critical shortage and manufactures tasks whose
//! type, priority, cost and reward are shaped by it. All randomness comes from
//! a seeded [`ChaCha8Rng`], so one seed always yields one task stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::priority_calculator::PriorityCalculator;
use crate::domain::models::{
    CriticalNeed, FactionId, FactionState, GeneratorConfig, Task, TaskId, TaskType, UpfrontCost,
    WorkerId, MAX_PRIORITY,
};

/// Manufactures tasks for factions according to their current need.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    config: GeneratorConfig,
    calculator: PriorityCalculator,
    rng: ChaCha8Rng,
    last_id: u64,
}

impl TaskGenerator {
    /// Creates a generator whose random source is seeded with `seed`.
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates a generator drawing from an existing random source.
    pub fn with_rng(config: GeneratorConfig, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            calculator: PriorityCalculator::new(),
            rng,
            last_id: 0,
        }
    }

    /// Generation limits in effect.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Allocates the next task id; ids double as creation sequence numbers.
    pub fn next_id(&mut self) -> TaskId {
        self.last_id += 1;
        TaskId(self.last_id)
    }

    /// How many tasks a fresh snapshot should produce.
    ///
    /// Draws a batch in `min_batch..=max_batch`, never more than the idle
    /// workers reported and never past the pending ceiling.
    pub fn snapshot_batch_size(&mut self, idle_workers: u32, pending: usize) -> usize {
        if idle_workers == 0 {
            return 0;
        }
        let low = self.config.min_batch.min(self.config.max_batch);
        let high = self.config.max_batch.max(low);
        let drawn = self.rng.gen_range(low..=high);

        let wanted = drawn.min(idle_workers) as usize;
        wanted.min(self.headroom(pending))
    }

    /// How many tasks an assignment pass may add for `idle` queued workers.
    pub fn forced_batch_size(&self, idle: usize, pending: usize) -> usize {
        idle.min(self.config.forced_batch_limit)
            .min(self.headroom(pending))
    }

    /// Picks a task type for `need`: restricted to the eligible set when the
    /// need is critical, uniform over every type otherwise.
    pub fn select_task_type(&mut self, need: CriticalNeed) -> TaskType {
        self.pick(need.eligible_task_types())
    }

    /// Picks a task type for an assignment pass.
    ///
    /// A faction low on wood or food draws a cost-free producer with
    /// probability `cost_free_bias`; otherwise any type is equally likely.
    pub fn select_pass_task_type(&mut self, low_resources: bool) -> TaskType {
        let bias = if (0.0..=1.0).contains(&self.config.cost_free_bias) {
            self.config.cost_free_bias
        } else {
            0.0
        };
        if low_resources && self.rng.gen_bool(bias) {
            self.pick(&TaskType::COST_FREE_PRODUCERS)
        } else {
            self.pick(&TaskType::ALL)
        }
    }

    /// Draws the upfront cost of one task of `task_type`.
    pub fn draw_cost(&mut self, task_type: TaskType) -> UpfrontCost {
        UpfrontCost {
            wood: task_type
                .wood_cost_range()
                .map_or(0, |range| self.rng.gen_range(range)),
            food: task_type
                .food_cost_range()
                .map_or(0, |range| self.rng.gen_range(range)),
        }
    }

    /// Builds one unbound task of `task_type` for `faction`.
    pub fn manufacture(&mut self, task_type: TaskType, need: CriticalNeed, faction: &FactionId) -> Task {
        let id = self.next_id();
        let priority = self.calculator.calculate(task_type, need);
        let cost = self.draw_cost(task_type);
        let reward = task_type
            .base_reward()
            .with_experience(self.config.generated_experience);

        Task::clamped(id, task_type, priority, faction.clone())
            .with_cost(cost)
            .with_reward(reward)
    }

    /// Tasks for a snapshot that reported idle workers.
    pub fn generate_for_snapshot(&mut self, snapshot: &FactionState, pending: usize) -> Vec<Task> {
        let need = snapshot.critical_need();
        let count = self.snapshot_batch_size(snapshot.idle_workers, pending);
        (0..count)
            .map(|_| {
                let task_type = self.select_task_type(need);
                self.manufacture(task_type, need, &snapshot.faction)
            })
            .collect()
    }

    /// Tasks for an assignment pass, biased toward cost-free work when low.
    pub fn generate_for_pass(
        &mut self,
        faction: &FactionId,
        need: CriticalNeed,
        low_resources: bool,
        count: usize,
    ) -> Vec<Task> {
        (0..count)
            .map(|_| {
                let task_type = self.select_pass_task_type(low_resources);
                self.manufacture(task_type, need, faction)
            })
            .collect()
    }

    /// A top-priority, cost-free task relieving `need`, already bound to `worker`.
    ///
    /// Returns `None` for [`CriticalNeed::Normal`], which has nothing to relieve.
    pub fn replacement_task(
        &mut self,
        need: CriticalNeed,
        faction: &FactionId,
        worker: WorkerId,
        experience: u64,
    ) -> Option<Task> {
        let eligible = need.eligible_task_types();
        if eligible.is_empty() {
            return None;
        }
        let task_type = self.pick(eligible);
        let id = self.next_id();
        let mut task = Task::clamped(id, task_type, MAX_PRIORITY, faction.clone())
            .with_reward(task_type.base_reward().with_experience(experience));
        task.assigned_to = Some(worker);
        Some(task)
    }

    fn headroom(&self, pending: usize) -> usize {
        self.config.max_pending_tasks.saturating_sub(pending)
    }

    fn pick(&mut self, candidates: &[TaskType]) -> TaskType {
        let pool = if candidates.is_empty() {
            &TaskType::ALL[..]
        } else {
            candidates
        };
        pool[self.rng.gen_range(0..pool.len())]
    }
}
