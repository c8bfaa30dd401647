//! Deterministic demo world driving one scheduler per house.
//!
//! Each weekly tick reports a snapshot, preempts on a change of need, shelves
//! backlog the house cannot afford, runs an assignment pass, advances bound
//! work by one week and pays out rewards. It then ends guard shifts, replaces
//! workers who left and applies passive income and upkeep. Every random draw
//! comes from the seeded world RNG or the schedulers' own seeded generators.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{
    Config, CriticalNeed, FactionId, FactionState, ResourcePool, TaskType, WorkerId,
};
use crate::services::{PriorityCalculator, Scheduler, SchedulerStatistics};

/// Houses available to the demo, in the order they are created.
pub const HOUSE_NAMES: [&str; 9] = [
    "stark",
    "lannister",
    "baratheon",
    "targaryen",
    "tyrell",
    "martell",
    "greyjoy",
    "arryn",
    "tully",
];

const WORKER_ID_STRIDE: u64 = 1_000_000;
const SOLDIERS_PER_TRAINING: u64 = 150;
const PASSIVE_GOLD: u64 = 40;
const PASSIVE_WOOD: RangeInclusive<u64> = 10..=20;
const PASSIVE_FOOD: RangeInclusive<u64> = 15..=30;
const FOOD_PER_WORKER: u64 = 3;
const DAMAGE_CHANCE: f64 = 0.1;
const ATTRITION_CHANCE: f64 = 0.02;
const SHIFT_END_CHANCE: f64 = 0.25;

/// Shape of a demo world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Weeks to simulate
    pub weeks: u32,
    /// Number of houses, capped at [`HOUSE_NAMES`]
    pub factions: usize,
    /// Workforce each house starts with and recruits back up to
    pub workers_per_faction: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            weeks: 12,
            factions: 3,
            workers_per_faction: 8,
        }
    }
}

/// What happened to one house in one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    /// Week number, starting at 1
    pub week: u32,
    /// House the row describes
    pub faction: FactionId,
    /// Critical need classified from this week's snapshot
    pub need: CriticalNeed,
    /// Tasks generated by the snapshot and the assignment pass
    pub generated: usize,
    /// Workers given a task during the pass
    pub bound: usize,
    /// Rejected pairings during the pass
    pub rejected: usize,
    /// Pending tasks shelved because the house could not afford them
    pub withdrawn: usize,
    /// Bound tasks cancelled by preemption
    pub preempted: usize,
    /// Tasks that reached full progress
    pub completed: usize,
    /// Workers relieved from a continuous post
    pub relieved: usize,
    /// Workers that left the house (each is replaced by a recruit)
    pub retired: usize,
    /// Pending tasks at the end of the week
    pub pending: usize,
    /// Idle workers at the end of the week
    pub idle: usize,
}

/// End-of-run state of one house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseSummary {
    /// House name
    pub faction: FactionId,
    /// Critical need under the final resources
    pub need: CriticalNeed,
    /// Final resource pool
    pub resources: ResourcePool,
    /// Soldier count
    pub soldiers: u64,
    /// Structures awaiting repair
    pub damaged_structures: u32,
    /// Current workforce
    pub workers: usize,
    /// Tasks completed over the whole run
    pub tasks_completed: usize,
    /// Experience earned over the whole run
    pub experience: u64,
    /// Scheduler counters at the end of the run
    pub statistics: SchedulerStatistics,
}

/// Full result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed the world was built from
    pub seed: u64,
    /// Weeks simulated
    pub weeks: u32,
    /// Final state of every house
    pub houses: Vec<HouseSummary>,
    /// One row per house per week
    pub timeline: Vec<WeekSummary>,
}

#[derive(Debug, Clone)]
struct House {
    faction: FactionId,
    soldiers: u64,
    damaged_structures: u32,
    workers: Vec<WorkerId>,
    next_worker: u64,
    scheduler: Scheduler,
    tasks_completed: usize,
    experience: u64,
}

impl House {
    fn snapshot(&self, pool: &ResourcePool) -> FactionState {
        let idle = self.idle_workers().len();
        FactionState {
            faction: self.faction.clone(),
            gold: pool.gold,
            food: pool.food,
            soldiers: self.soldiers,
            damaged_structures: self.damaged_structures,
            active_workers: u32::try_from(self.workers.len() - idle).unwrap_or(u32::MAX),
            idle_workers: u32::try_from(idle).unwrap_or(u32::MAX),
        }
    }

    fn idle_workers(&self) -> Vec<WorkerId> {
        self.workers
            .iter()
            .copied()
            .filter(|&worker| self.scheduler.active_task(worker).is_none())
            .collect()
    }

    /// Adds a worker with a random profession.
    fn recruit(&mut self, rng: &mut ChaCha8Rng) -> WorkerId {
        self.next_worker += 1;
        let worker = WorkerId(self.next_worker);
        let profession = TaskType::ALL[rng.gen_range(0..TaskType::ALL.len())];
        self.scheduler.register_capability(worker, profession.as_str());
        self.workers.push(worker);
        worker
    }
}

/// A small world of competing houses.
#[derive(Debug, Clone)]
pub struct Simulation {
    seed: u64,
    week: u32,
    rng: ChaCha8Rng,
    houses: Vec<House>,
    ledger: BTreeMap<FactionId, ResourcePool>,
    timeline: Vec<WeekSummary>,
}

impl Simulation {
    /// Creates `settings.factions` houses (at most [`HOUSE_NAMES`]) with
    /// randomised starting resources.
    pub fn new(config: &Config, settings: &SimulationSettings) -> Self {
        let seed = config.seed;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut houses = Vec::new();
        let mut ledger = BTreeMap::new();

        for (index, name) in (0u64..).zip(HOUSE_NAMES.iter().take(settings.factions)) {
            let faction = FactionId::from(*name);
            let mut house = House {
                faction: faction.clone(),
                soldiers: rng.gen_range(2000..=8000),
                damaged_structures: rng.gen_range(0..=2),
                workers: Vec::new(),
                next_worker: index * WORKER_ID_STRIDE,
                scheduler: Scheduler::with_seed(config, seed.wrapping_add(index + 1)),
                tasks_completed: 0,
                experience: 0,
            };
            for _ in 0..settings.workers_per_faction {
                house.recruit(&mut rng);
            }

            ledger.insert(
                faction,
                ResourcePool::new(
                    rng.gen_range(400..=3000),
                    rng.gen_range(200..=1500),
                    rng.gen_range(50..=600),
                ),
            );
            houses.push(house);
        }

        Self {
            seed,
            week: 0,
            rng,
            houses,
            ledger,
            timeline: Vec::new(),
        }
    }

    /// Weeks simulated so far.
    pub const fn week(&self) -> u32 {
        self.week
    }

    /// Runs `weeks` ticks and reports the final state.
    pub fn run(mut self, weeks: u32) -> SimulationReport {
        for _ in 0..weeks {
            self.tick();
        }
        self.report()
    }

    /// Advances the world by one week.
    #[instrument(skip(self), fields(week = self.week + 1))]
    pub fn tick(&mut self) {
        self.week += 1;
        for house in &mut self.houses {
            let summary = Self::tick_house(self.week, house, &mut self.ledger, &mut self.rng);
            debug!(
                "Week {} {}: need {}, {} bound, {} rejected, {} withdrawn, {} completed",
                summary.week,
                summary.faction,
                summary.need,
                summary.bound,
                summary.rejected,
                summary.withdrawn,
                summary.completed
            );
            self.timeline.push(summary);
        }
        info!("Week {} simulated for {} houses", self.week, self.houses.len());
    }

    fn tick_house(
        week: u32,
        house: &mut House,
        ledger: &mut BTreeMap<FactionId, ResourcePool>,
        rng: &mut ChaCha8Rng,
    ) -> WeekSummary {
        let faction = house.faction.clone();
        let pool = ledger.get(&faction).copied().unwrap_or_default();

        let snapshot = house.snapshot(&pool);
        let update = house.scheduler.update_faction_state(snapshot);
        let preempted = if update.need_changed() {
            house.scheduler.preempt(&faction).preempted.len()
        } else {
            0
        };
        let withdrawn = Self::review_backlog(
            &mut house.scheduler,
            &faction,
            &pool,
            update.need,
            update.need_changed(),
        );

        let idle = house.idle_workers();
        let pass = house.scheduler.run_assignment_pass(&idle, &faction, ledger);

        let mut completed = 0;
        let bound: Vec<(WorkerId, f64)> = house
            .scheduler
            .active_tasks()
            .map(|(&worker, task)| (worker, task.duration.progress_for(1.0)))
            .collect();
        for (worker, increment) in bound {
            let Some(task) = house.scheduler.advance_progress(worker, increment) else {
                continue;
            };
            completed += 1;
            house.tasks_completed += 1;
            house.experience += task.reward.experience;
            if let Some(pool) = ledger.get_mut(&faction) {
                pool.credit(&task.reward);
            }
            match task.task_type {
                TaskType::Training => house.soldiers += SOLDIERS_PER_TRAINING,
                TaskType::Construction | TaskType::Carpentry => {
                    house.damaged_structures = house.damaged_structures.saturating_sub(1);
                }
                _ => {}
            }
        }

        let relieved = Self::end_shifts(house, rng);
        let retired = Self::apply_attrition(house, rng);
        Self::apply_upkeep(house, ledger, rng);

        let statistics = house.scheduler.statistics();
        WeekSummary {
            week,
            faction,
            need: update.need,
            generated: update.generated + pass.generated,
            bound: pass.bound_count(),
            rejected: pass.rejected_count(),
            withdrawn,
            preempted,
            completed,
            relieved,
            retired,
            pending: statistics.pending_count,
            idle: statistics.idle_worker_count,
        }
    }

    /// Withdraws pending work the house cannot pay for and, after a change of
    /// need, re-rates what is left under the new need.
    ///
    /// Returns the number of tasks withdrawn.
    fn review_backlog(
        scheduler: &mut Scheduler,
        faction: &FactionId,
        pool: &ResourcePool,
        need: CriticalNeed,
        rerate: bool,
    ) -> usize {
        let calculator = PriorityCalculator::new();
        let mut shelved = Vec::new();
        let mut rerated = Vec::new();
        for task in scheduler.pending_tasks() {
            if task.faction != *faction {
                continue;
            }
            if !task.costs_consumed && pool.shortfall(&task.cost).is_some() {
                shelved.push(task.id);
            } else if rerate {
                let priority = calculator.calculate(task.task_type, need);
                if priority != task.priority {
                    rerated.push((task.id, priority));
                }
            }
        }

        for (id, priority) in rerated {
            if let Err(err) = scheduler.reprioritize_task(id, priority) {
                warn!("Could not re-rate {}: {}", id, err);
            }
        }
        shelved
            .into_iter()
            .filter(|&id| scheduler.withdraw_task(id).is_ok())
            .count()
    }

    /// Relieves workers on continuous posts at the end of a shift.
    fn end_shifts(house: &mut House, rng: &mut ChaCha8Rng) -> usize {
        let on_duty: Vec<WorkerId> = house
            .scheduler
            .active_tasks()
            .filter(|(_, task)| task.is_continuous())
            .map(|(&worker, _)| worker)
            .collect();

        let mut relieved = 0;
        for worker in on_duty {
            if !rng.gen_bool(SHIFT_END_CHANCE) {
                continue;
            }
            if let Some(task) = house.scheduler.report_completion(worker) {
                house.experience += task.reward.experience;
                relieved += 1;
            }
        }
        relieved
    }

    /// Workers leave at random; each is replaced by a recruit.
    fn apply_attrition(house: &mut House, rng: &mut ChaCha8Rng) -> usize {
        let leaving: Vec<WorkerId> = house
            .workers
            .iter()
            .copied()
            .filter(|_| rng.gen_bool(ATTRITION_CHANCE))
            .collect();
        for &worker in &leaving {
            if let Some(task) = house.scheduler.retire_worker(worker) {
                debug!("{} left {} abandoning {}", worker, house.faction, task.id);
            }
        }
        house.workers.retain(|worker| !leaving.contains(worker));
        for _ in &leaving {
            house.recruit(rng);
        }
        leaving.len()
    }

    fn apply_upkeep(
        house: &mut House,
        ledger: &mut BTreeMap<FactionId, ResourcePool>,
        rng: &mut ChaCha8Rng,
    ) {
        if let Some(pool) = ledger.get_mut(&house.faction) {
            pool.gold = pool.gold.saturating_add(PASSIVE_GOLD);
            pool.wood = pool.wood.saturating_add(rng.gen_range(PASSIVE_WOOD));
            pool.food = pool.food.saturating_add(rng.gen_range(PASSIVE_FOOD));
            let upkeep = FOOD_PER_WORKER * house.workers.len() as u64;
            pool.food = pool.food.saturating_sub(upkeep);
        }
        if rng.gen_bool(DAMAGE_CHANCE) {
            house.damaged_structures += 1;
        }
    }

    /// Final state of every house plus the timeline so far.
    pub fn report(&self) -> SimulationReport {
        let houses = self
            .houses
            .iter()
            .map(|house| {
                let resources = self.ledger.get(&house.faction).copied().unwrap_or_default();
                HouseSummary {
                    faction: house.faction.clone(),
                    need: house.snapshot(&resources).critical_need(),
                    resources,
                    soldiers: house.soldiers,
                    damaged_structures: house.damaged_structures,
                    workers: house.workers.len(),
                    tasks_completed: house.tasks_completed,
                    experience: house.experience,
                    statistics: house.scheduler.statistics(),
                }
            })
            .collect();

        SimulationReport {
            seed: self.seed,
            weeks: self.week,
            houses,
            timeline: self.timeline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GeneratorConfig, SchedulerConfig};
    use crate::services::TaskGenerator;

    fn settings(weeks: u32, factions: usize) -> SimulationSettings {
        SimulationSettings {
            weeks,
            factions,
            workers_per_faction: 6,
        }
    }

    fn quiet_scheduler() -> Scheduler {
        let generator = GeneratorConfig {
            forced_batch_limit: 0,
            ..GeneratorConfig::default()
        };
        Scheduler::new(SchedulerConfig::default(), TaskGenerator::new(generator, 21))
    }

    #[test]
    fn test_same_seed_same_report() {
        let config = Config::default();
        let a = Simulation::new(&config, &settings(8, 3)).run(8);
        let b = Simulation::new(&config, &settings(8, 3)).run(8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_factions_capped_by_house_list() {
        let report = Simulation::new(&Config::default(), &settings(1, 50)).run(1);
        assert_eq!(report.houses.len(), HOUSE_NAMES.len());
        assert_eq!(report.timeline.len(), HOUSE_NAMES.len());
    }

    #[test]
    fn test_workers_get_busy() {
        let report = Simulation::new(&Config::default(), &settings(4, 2)).run(4);
        assert_eq!(report.weeks, 4);
        let bound: usize = report.timeline.iter().map(|week| week.bound).sum();
        assert!(bound > 0);
        for house in &report.houses {
            assert!(house.statistics.pending_count <= Config::default().generator.max_pending_tasks);
            assert!(house.statistics.active_count <= house.workers);
        }
    }

    #[test]
    fn test_houses_keep_working_for_a_year() {
        let settings = SimulationSettings {
            weeks: 52,
            ..SimulationSettings::default()
        };
        let report = Simulation::new(&Config::default(), &settings).run(52);

        let last_weeks: Vec<&WeekSummary> =
            report.timeline.iter().filter(|week| week.week > 44).collect();
        assert_eq!(last_weeks.len(), 8 * settings.factions);
        let bound: usize = last_weeks.iter().map(|week| week.bound).sum();
        let completed: usize = last_weeks.iter().map(|week| week.completed).sum();
        assert!(bound > 0, "no task bound in the last eight weeks");
        assert!(completed > 0, "no task completed in the last eight weeks");

        for house in &report.houses {
            assert_eq!(house.workers, 8);
        }
    }

    #[test]
    fn test_review_backlog_withdraws_unaffordable_tasks() {
        let mut scheduler = quiet_scheduler();
        let lannister = FactionId::from("lannister");
        let construction = scheduler
            .submit_task(&lannister, TaskType::Construction, 9, None)
            .unwrap();
        let study = scheduler
            .submit_task(&lannister, TaskType::Study, 3, None)
            .unwrap();

        let broke = ResourcePool::new(5000, 5000, 0);
        let withdrawn = Simulation::review_backlog(
            &mut scheduler,
            &lannister,
            &broke,
            CriticalNeed::Normal,
            false,
        );

        assert_eq!(withdrawn, 1);
        let pending: Vec<_> = scheduler.pending_tasks().iter().map(|task| task.id).collect();
        assert_eq!(pending, vec![study]);
        assert!(scheduler.withdraw_task(construction).is_err());

        let mut ledger = BTreeMap::from([(lannister.clone(), broke)]);
        let report = scheduler.run_assignment_pass(&[WorkerId(1)], &lannister, &mut ledger);
        assert_eq!(report.bound_count(), 1);
    }

    #[test]
    fn test_review_backlog_rerates_after_need_change() {
        let mut scheduler = quiet_scheduler();
        let tyrell = FactionId::from("tyrell");
        let mining = scheduler
            .submit_task(&tyrell, TaskType::Mining, 10, None)
            .unwrap();
        let farming = scheduler
            .submit_task(&tyrell, TaskType::Agriculture, 8, None)
            .unwrap();
        let rich = ResourcePool::new(5000, 5000, 5000);

        let withdrawn =
            Simulation::review_backlog(&mut scheduler, &tyrell, &rich, CriticalNeed::Food, true);

        assert_eq!(withdrawn, 0);
        let pending: Vec<(_, u8)> = scheduler
            .pending_tasks()
            .iter()
            .map(|task| (task.id, task.priority))
            .collect();
        assert_eq!(pending, vec![(farming, 10), (mining, 7)]);
    }
}
