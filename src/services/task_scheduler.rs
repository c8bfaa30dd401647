//! Resource-constrained task scheduler.
//!
//! Owns the pending-task heap, the idle-worker FIFO, the active bindings and
//! the capability index. The surrounding simulation steps it once per tick:
//! snapshot updates feed the generator, assignment passes pair the oldest idle
//! worker with the most urgent pending task, and completions release workers.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use super::capability_index::CapabilityIndex;
use super::task_generator::TaskGenerator;
use crate::domain::error::TaskError;
use crate::domain::models::{
    Config, CriticalNeed, FactionId, FactionState, Location, PriorityHeap, ResourceKind,
    SchedulerConfig, Task, TaskId, TaskType, WorkerId, MAX_PRIORITY, MIN_PRIORITY,
};
use crate::domain::ports::FactionLedger;

/// Why a task could not be bound during an assignment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The owning faction cannot cover one of the task's upfront costs
    InsufficientResources {
        /// Resource that fell short
        resource: ResourceKind,
        /// Amount the task needs
        required: u64,
        /// Amount the faction holds
        available: u64,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientResources {
                resource,
                required,
                available,
            } => write!(f, "insufficient {resource}: requires {required}, has {available}"),
        }
    }
}

/// What happened to one worker drawn from the idle queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// The worker now holds the task
    Bound {
        /// Task given to the worker
        task: TaskId,
        /// Its type
        task_type: TaskType,
        /// Its priority at binding time
        priority: u8,
    },
    /// The task went back to the heap and the worker to the idle queue
    Rejected {
        /// Task that could not be admitted
        task: TaskId,
        /// Why admission failed
        reason: RejectionReason,
    },
}

/// One iteration of an assignment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Worker drawn from the idle queue
    pub worker: WorkerId,
    /// What happened to it
    #[serde(flatten)]
    pub outcome: AssignmentOutcome,
}

impl Assignment {
    /// The bound task id, if the worker was given work.
    pub const fn bound_task(&self) -> Option<TaskId> {
        match self.outcome {
            AssignmentOutcome::Bound { task, .. } => Some(task),
            AssignmentOutcome::Rejected { .. } => None,
        }
    }

    /// Why the worker was turned away, if it was.
    pub const fn rejection(&self) -> Option<&RejectionReason> {
        match &self.outcome {
            AssignmentOutcome::Bound { .. } => None,
            AssignmentOutcome::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Result of one [`Scheduler::run_assignment_pass`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Bindings and rejections, in the order they happened
    pub assignments: Vec<Assignment>,
    /// Tasks generated at the start of the pass
    pub generated: usize,
    /// Workers left in the idle queue when the pass ended
    pub workers_still_idle: usize,
    /// Tasks left pending when the pass ended
    pub pending_remaining: usize,
    /// Iterations the loop ran
    pub iterations: usize,
    /// `true` if the pass ended because consecutive rejections hit the cap
    pub stopped_at_rejection_cap: bool,
}

impl PassReport {
    /// Number of workers given a task.
    pub fn bound_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.bound_task().is_some())
            .count()
    }

    /// Number of rejected pairings.
    pub fn rejected_count(&self) -> usize {
        self.assignments.len() - self.bound_count()
    }
}

/// Outcome of feeding a faction snapshot to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotUpdate {
    /// Need classified from this snapshot
    pub need: CriticalNeed,
    /// Need classified from the previous snapshot, if any
    pub previous_need: Option<CriticalNeed>,
    /// Tasks generated for the snapshot
    pub generated: usize,
}

impl SnapshotUpdate {
    /// `true` when the classification differs from the previous snapshot's.
    pub fn need_changed(&self) -> bool {
        self.previous_need.is_some_and(|previous| previous != self.need)
    }
}

/// One bound task cancelled in favour of an urgent replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preemption {
    /// Worker moved to the replacement
    pub worker: WorkerId,
    /// The cancelled task, unbound; its consumed costs are not refunded
    pub cancelled: Task,
    /// Priority-10 task now bound to the worker
    pub replacement: TaskId,
}

/// Result of [`Scheduler::preempt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreemptionOutcome {
    /// Need the replacements address
    pub need: CriticalNeed,
    /// Cancelled tasks, in worker order
    pub preempted: Vec<Preemption>,
}

/// Read-only counters for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatistics {
    /// Tasks waiting in the heap
    pub pending_count: usize,
    /// Tasks bound to a worker
    pub active_count: usize,
    /// Workers in the idle queue
    pub idle_worker_count: usize,
    /// Factions that have reported a snapshot
    pub tracked_faction_count: usize,
}

/// Tick-driven scheduler pairing idle workers with pending tasks.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    generator: TaskGenerator,
    pending: PriorityHeap<Task>,
    idle_queue: VecDeque<WorkerId>,
    queued: HashSet<WorkerId>,
    active: BTreeMap<WorkerId, Task>,
    faction_states: HashMap<FactionId, FactionState>,
    capabilities: CapabilityIndex,
}

impl Scheduler {
    /// Creates an empty scheduler around `generator`.
    pub fn new(config: SchedulerConfig, generator: TaskGenerator) -> Self {
        Self {
            config,
            generator,
            pending: PriorityHeap::new(),
            idle_queue: VecDeque::new(),
            queued: HashSet::new(),
            active: BTreeMap::new(),
            faction_states: HashMap::new(),
            capabilities: CapabilityIndex::new(),
        }
    }

    /// Builds a scheduler whose generator is seeded from `config.seed`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_seed(config, config.seed)
    }

    /// Builds a scheduler from `config` with an explicit seed.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::new(
            config.scheduler.clone(),
            TaskGenerator::new(config.generator.clone(), seed),
        )
    }

    /// Stores the latest snapshot for a faction and generates work for its
    /// idle workers.
    ///
    /// The snapshot fully supersedes the previous one. When it reports idle
    /// workers, `min(idle, batch)` tasks shaped by the faction's critical need
    /// are pushed, never growing the pending count past the ceiling.
    #[instrument(skip(self, state), fields(faction = %state.faction))]
    pub fn update_faction_state(&mut self, state: FactionState) -> SnapshotUpdate {
        let need = state.critical_need();
        let previous_need = self
            .faction_states
            .get(&state.faction)
            .map(FactionState::critical_need);

        let tasks = self.generator.generate_for_snapshot(&state, self.pending.len());
        let generated = tasks.len();
        for task in tasks {
            self.enqueue(task);
        }
        if generated > 0 {
            debug!(
                "Generated {} tasks for {} under need {}",
                generated, state.faction, need
            );
        }

        self.faction_states.insert(state.faction.clone(), state);
        SnapshotUpdate {
            need,
            previous_need,
            generated,
        }
    }

    /// The last snapshot reported for `faction`.
    pub fn faction_state(&self, faction: &FactionId) -> Option<&FactionState> {
        self.faction_states.get(faction)
    }

    /// Adds `worker` to the back of the idle queue.
    ///
    /// No-op if the worker is already queued or currently bound.
    pub fn register_idle_worker(&mut self, worker: WorkerId) {
        if self.active.contains_key(&worker) || !self.queued.insert(worker) {
            return;
        }
        self.idle_queue.push_back(worker);
    }

    /// Records `worker`'s profession, replacing any previous one.
    pub fn register_capability(&mut self, worker: WorkerId, tag: impl Into<String>) {
        self.capabilities.register(worker, tag);
    }

    /// Workers whose profession is `tag`.
    pub fn workers_with_capability(&self, tag: &str) -> impl Iterator<Item = WorkerId> + '_ {
        self.capabilities.lookup(tag)
    }

    /// Queues a hand-made task for `faction`.
    ///
    /// Costs are drawn from the type's ranges and the reward carries the
    /// configured experience.
    pub fn submit_task(
        &mut self,
        faction: &FactionId,
        task_type: TaskType,
        priority: u8,
        location: Option<Location>,
    ) -> Result<TaskId, TaskError> {
        let id = self.generator.next_id();
        let experience = self.generator.config().generated_experience;
        let task = Task::new(id, task_type, priority, faction.clone())?
            .with_cost(self.generator.draw_cost(task_type))
            .with_reward(task_type.base_reward().with_experience(experience))
            .with_location(location);

        debug!("Task {} submitted as {} with priority {}", id, task_type, priority);
        self.enqueue(task);
        Ok(id)
    }

    /// Moves a pending task to a new priority, keeping its creation sequence.
    pub fn reprioritize_task(&mut self, id: TaskId, priority: u8) -> Result<(), TaskError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(TaskError::InvalidPriority(priority));
        }
        let mut task = self.pending.take(&id).ok_or(TaskError::TaskNotFound(id))?;
        task.priority = priority;
        self.enqueue(task);
        Ok(())
    }

    /// Removes a pending task before any worker picks it up.
    ///
    /// Bound tasks are not pending and cannot be withdrawn.
    pub fn withdraw_task(&mut self, id: TaskId) -> Result<Task, TaskError> {
        let task = self.pending.take(&id).ok_or(TaskError::TaskNotFound(id))?;
        debug!("Task {} ({}) withdrawn", id, task.task_type);
        Ok(task)
    }

    /// Runs one full assignment pass for `faction`.
    ///
    /// Every supplied worker that is neither bound nor queued joins the idle
    /// queue. While below the pending ceiling, the pass first generates up to
    /// `min(idle, forced_batch_limit, headroom)` tasks, favouring cost-free
    /// producers when the faction's pool runs low. It then pairs workers
    /// oldest-first with tasks most-urgent-first, charging each task's owning
    /// faction through `ledger`. The loop stops once consecutive rejections
    /// reach `min(idle, pending, rejection_cap)`.
    #[instrument(skip(self, idle_workers, ledger))]
    pub fn run_assignment_pass<L>(
        &mut self,
        idle_workers: &[WorkerId],
        faction: &FactionId,
        ledger: &mut L,
    ) -> PassReport
    where
        L: FactionLedger + ?Sized,
    {
        for &worker in idle_workers {
            self.register_idle_worker(worker);
        }

        let generated = self.generate_pass_tasks(faction, ledger);

        let max_rejections = self
            .idle_queue
            .len()
            .min(self.pending.len())
            .min(self.config.rejection_cap);

        let mut report = PassReport {
            generated,
            ..PassReport::default()
        };
        let mut consecutive_rejections = 0;

        while consecutive_rejections < max_rejections {
            let Some(worker) = self.idle_queue.pop_front() else {
                break;
            };
            let Some(mut popped) = self.pending.pop_entry() else {
                self.idle_queue.push_front(worker);
                break;
            };
            report.iterations += 1;

            match Self::admit(&mut popped.item, ledger) {
                Ok(()) => {
                    self.queued.remove(&worker);
                    let task = &mut popped.item;
                    task.assigned_to = Some(worker);
                    debug!(
                        "Bound {} ({}, priority {}) to {}",
                        task.id, task.task_type, task.priority, worker
                    );
                    report.assignments.push(Assignment {
                        worker,
                        outcome: AssignmentOutcome::Bound {
                            task: task.id,
                            task_type: task.task_type,
                            priority: task.priority,
                        },
                    });
                    self.active.insert(worker, popped.item);
                    consecutive_rejections = 0;
                }
                Err(reason) => {
                    let task = popped.item.id;
                    trace!("Rejected {} for {}: {}", task, worker, reason);
                    self.pending.reinsert(popped);
                    self.idle_queue.push_back(worker);
                    report.assignments.push(Assignment {
                        worker,
                        outcome: AssignmentOutcome::Rejected { task, reason },
                    });
                    consecutive_rejections += 1;
                }
            }
        }

        report.stopped_at_rejection_cap =
            max_rejections > 0 && consecutive_rejections >= max_rejections;
        report.workers_still_idle = self.idle_queue.len();
        report.pending_remaining = self.pending.len();

        if report.stopped_at_rejection_cap {
            warn!(
                "Assignment pass for {} stopped after {} consecutive rejections; {} workers still idle",
                faction, consecutive_rejections, report.workers_still_idle
            );
        }
        info!(
            "Assignment pass for {}: {} bound, {} rejected, {} idle, {} pending",
            faction,
            report.bound_count(),
            report.rejected_count(),
            report.workers_still_idle,
            report.pending_remaining
        );
        report
    }

    /// Adds progress to `worker`'s task and completes it on reaching 1.0.
    ///
    /// Continuous tasks never accrue progress, so this returns `None` for
    /// them; only [`report_completion`](Self::report_completion) ends them.
    pub fn advance_progress(&mut self, worker: WorkerId, increment: f64) -> Option<Task> {
        let finished = self.active.get_mut(&worker)?.advance(increment);
        if finished {
            self.report_completion(worker)
        } else {
            None
        }
    }

    /// Unbinds `worker`'s finished task and puts the worker back in the queue.
    ///
    /// The returned task carries the reward for the caller to apply. A
    /// continuous task is finished whenever the caller says so, such as at
    /// the end of a guard shift.
    pub fn report_completion(&mut self, worker: WorkerId) -> Option<Task> {
        let task = self.active.get(&worker)?;
        if !task.is_continuous() && task.progress < 1.0 {
            warn!(
                "{} reported completion of {} at progress {:.2}",
                worker, task.id, task.progress
            );
        }
        let mut task = self.active.remove(&worker)?;
        task.mark_completed();
        self.register_idle_worker(worker);
        debug!("{} completed {} ({})", worker, task.id, task.task_type);
        Some(task)
    }

    /// Cancels low-priority work unrelated to `faction`'s current need.
    ///
    /// At most `preemption_limit` bound tasks of the faction whose type does
    /// not relieve the need and whose priority is below the ceiling are
    /// cancelled. Each freed worker is immediately bound to a priority-10,
    /// cost-free replacement addressing the need. Does nothing when the need
    /// is normal or the faction has never reported a snapshot.
    #[instrument(skip(self))]
    pub fn preempt(&mut self, faction: &FactionId) -> PreemptionOutcome {
        let need = self
            .faction_states
            .get(faction)
            .map_or(CriticalNeed::Normal, FactionState::critical_need);
        let mut outcome = PreemptionOutcome {
            need,
            preempted: Vec::new(),
        };
        if !need.is_critical() {
            return outcome;
        }

        let candidates: Vec<WorkerId> = self
            .active
            .iter()
            .filter(|(_, task)| {
                task.faction == *faction
                    && !need.is_relieved_by(task.task_type)
                    && task.priority < self.config.preemption_priority_ceiling
            })
            .map(|(&worker, _)| worker)
            .take(self.config.preemption_limit)
            .collect();

        for worker in candidates {
            let Some(replacement) = self.generator.replacement_task(
                need,
                faction,
                worker,
                self.config.preemption_experience,
            ) else {
                break;
            };
            let Some(mut cancelled) = self.active.remove(&worker) else {
                continue;
            };
            cancelled.assigned_to = None;
            info!(
                "Preempted {} ({}) on {} for {} ({})",
                cancelled.id, cancelled.task_type, worker, replacement.id, replacement.task_type
            );

            outcome.preempted.push(Preemption {
                worker,
                cancelled,
                replacement: replacement.id,
            });
            self.active.insert(worker, replacement);
        }
        outcome
    }

    /// Removes a worker that left the simulation.
    ///
    /// Drops it from the idle queue and the capability index and returns its
    /// bound task, if any, unbound and without rewards.
    pub fn retire_worker(&mut self, worker: WorkerId) -> Option<Task> {
        if self.queued.remove(&worker) {
            self.idle_queue.retain(|&w| w != worker);
        }
        self.capabilities.deregister(worker);

        let mut task = self.active.remove(&worker)?;
        task.assigned_to = None;
        debug!("{} retired, dropping {}", worker, task.id);
        Some(task)
    }

    /// The task bound to `worker`.
    pub fn active_task(&self, worker: WorkerId) -> Option<&Task> {
        self.active.get(&worker)
    }

    /// Bound tasks keyed by worker, in worker order.
    pub fn active_tasks(&self) -> impl Iterator<Item = (&WorkerId, &Task)> {
        self.active.iter()
    }

    /// `true` if any worker is waiting in the idle queue.
    pub fn has_idle_workers(&self) -> bool {
        !self.idle_queue.is_empty()
    }

    /// Idle workers, oldest first.
    pub fn idle_workers(&self) -> impl Iterator<Item = &WorkerId> {
        self.idle_queue.iter()
    }

    /// Pending tasks in the order they would be handed out.
    pub fn pending_tasks(&self) -> Vec<&Task> {
        self.pending
            .sorted_items()
            .into_iter()
            .map(|(task, _)| task)
            .collect()
    }

    /// Current counters.
    pub fn statistics(&self) -> SchedulerStatistics {
        SchedulerStatistics {
            pending_count: self.pending.len(),
            active_count: self.active.len(),
            idle_worker_count: self.idle_queue.len(),
            tracked_faction_count: self.faction_states.len(),
        }
    }

    fn enqueue(&mut self, task: Task) {
        let priority = task.heap_priority();
        let sequence = task.sequence;
        self.pending.push_with_sequence(task, priority, sequence);
    }

    fn generate_pass_tasks<L>(&mut self, faction: &FactionId, ledger: &L) -> usize
    where
        L: FactionLedger + ?Sized,
    {
        let pending = self.pending.len();
        let count = self
            .generator
            .forced_batch_size(self.idle_queue.len(), pending);
        if count == 0 {
            return 0;
        }

        let need = self
            .faction_states
            .get(faction)
            .map_or(CriticalNeed::Normal, FactionState::critical_need);
        let threshold = self.generator.config().low_resource_threshold;
        let low_resources = ledger
            .pool(faction)
            .is_some_and(|pool| pool.is_low(threshold));

        let tasks = self
            .generator
            .generate_for_pass(faction, need, low_resources, count);
        let generated = tasks.len();
        for task in tasks {
            self.enqueue(task);
        }
        debug!(
            "Generated {} tasks for {} before assignment (low resources: {})",
            generated, faction, low_resources
        );
        generated
    }

    /// Checks and charges `task`'s upfront cost against its faction's pool.
    ///
    /// A task whose costs were already consumed, or whose faction the ledger
    /// does not track, is admitted without charge.
    fn admit<L>(task: &mut Task, ledger: &mut L) -> Result<(), RejectionReason>
    where
        L: FactionLedger + ?Sized,
    {
        if task.costs_consumed || task.cost.is_free() {
            return Ok(());
        }
        let Some(pool) = ledger.pool_mut(&task.faction) else {
            return Ok(());
        };
        if let Some((resource, required, available)) = pool.shortfall(&task.cost) {
            return Err(RejectionReason::InsufficientResources {
                resource,
                required,
                available,
            });
        }
        pool.deduct(&task.cost);
        task.costs_consumed = true;
        Ok(())
    }

    #[cfg(test)]
    fn push_pending(&mut self, task: Task) {
        self.enqueue(task);
    }
}
