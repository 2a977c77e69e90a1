//! Placement and reconfiguration engine.
//!
//! # Algorithm
//!
//! 1. **Admission** (`schedule`): a job is placed at its submission time if
//!    at least `min_servers` servers (never fewer than one) are free from
//!    that instant on;
//!    otherwise it joins a FIFO queue.
//! 2. **Placement**: `min(max_servers, free)` servers are sampled uniformly
//!    without replacement; the task runs for `mass / n^alpha`.
//! 3. **Update** (`update_schedule`): the queue is drained in FIFO order,
//!    each placement shrinking the free pool seen by later jobs. Then, if
//!    reconfiguration is enabled, active tasks are grown onto the remaining
//!    free servers in ascending job-id order, each taking servers out of the
//!    pool before the next is considered.
//!
//! # Invariant
//! At any instant a server is held by at most one task. Tasks record when
//! each server was acquired, so the invariant also holds for instants
//! before a reconfiguration.

use std::collections::{HashMap, HashSet};

use rand::prelude::IndexedRandom;
use rand::Rng;
use tracing::trace;

use super::{SchedulerConfig, SchedulerFeatures};
use crate::error::{SchedulerError, SchedulerResult};
use crate::models::{speedup, Job, JobId, Server, Task};

/// Outcome of submitting a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The job was placed immediately on `servers` servers.
    Placed { servers: usize },
    /// Not enough free servers; the job was queued.
    Deferred,
}

/// What one `update_schedule` call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Queued jobs placed.
    pub placed: usize,
    /// Running tasks that received extra servers.
    pub reconfigured: usize,
}

/// A running task that could legally receive more servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconfigCandidate {
    /// Index into [`Scheduler::tasks`].
    pub task: usize,
    /// Job the task executes.
    pub job_id: JobId,
    /// Feasible increase in server count.
    pub increase: usize,
}

/// Event-driven multi-server scheduler.
///
/// The driving loop submits jobs in non-decreasing submission order and
/// calls [`update_schedule`](Self::update_schedule) at task completions.
/// Randomness (server sampling) comes from the generator passed in by the
/// caller, so a run is a pure function of its inputs and seed.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use u_schedsim::models::{Job, Server};
/// use u_schedsim::scheduler::{Admission, Scheduler, SchedulerConfig, SchedulerFeatures};
///
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let mut scheduler = Scheduler::new(
///     Server::pool(4),
///     SchedulerConfig::default(),
///     SchedulerFeatures::fifo(),
/// );
/// let job = Job::new(1, 0.0, 8.0).with_servers(1, 4);
/// assert_eq!(
///     scheduler.schedule(job, &mut rng).unwrap(),
///     Admission::Placed { servers: 4 }
/// );
/// assert!((scheduler.tasks()[0].end_time - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    servers: Vec<Server>,
    jobs: Vec<Job>,
    job_index: HashMap<JobId, usize>,
    tasks: Vec<Task>,
    queued: Vec<JobId>,
    config: SchedulerConfig,
    features: SchedulerFeatures,
    clock: f64,
    reconfigurations: usize,
}

impl Scheduler {
    /// Creates a scheduler owning `servers`.
    pub fn new(servers: Vec<Server>, config: SchedulerConfig, features: SchedulerFeatures) -> Self {
        Self {
            servers,
            jobs: Vec::new(),
            job_index: HashMap::new(),
            tasks: Vec::new(),
            queued: Vec::new(),
            config,
            features,
            clock: 0.0,
            reconfigurations: 0,
        }
    }

    /// The server pool.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Submitted jobs, in submission order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// All tasks, past and active, in placement order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Deferred job ids, in FIFO order.
    pub fn queued_jobs(&self) -> &[JobId] {
        &self.queued
    }

    /// Policy parameters.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Policy toggles.
    pub fn features(&self) -> SchedulerFeatures {
        self.features
    }

    /// Total reconfigurations applied so far.
    pub fn reconfiguration_count(&self) -> usize {
        self.reconfigurations
    }

    /// Looks up a submitted job.
    pub fn job(&self, id: JobId) -> SchedulerResult<&Job> {
        self.job_index
            .get(&id)
            .map(|&idx| &self.jobs[idx])
            .ok_or(SchedulerError::UnknownJob(id))
    }

    /// Earliest task completion strictly after `time`.
    pub fn next_completion_after(&self, time: f64) -> Option<f64> {
        self.tasks
            .iter()
            .map(|t| t.end_time)
            .filter(|&end| end > time)
            .reduce(f64::min)
    }

    /// Submits a job (admission control).
    pub fn schedule<R: Rng>(&mut self, job: Job, rng: &mut R) -> SchedulerResult<Admission> {
        if self.job_index.contains_key(&job.id) {
            return Err(SchedulerError::DuplicateJob(job.id));
        }
        self.advance_clock(job.submission_time)?;
        self.job_index.insert(job.id, self.jobs.len());
        self.jobs.push(job);

        let candidates = if self.tasks.is_empty() {
            self.servers.clone()
        } else {
            self.free_servers_from(job.submission_time)
        };

        let needed = job.min_servers.max(1);
        if candidates.len() < needed {
            trace!(
                job = job.id,
                free = candidates.len(),
                needed,
                "job deferred"
            );
            self.queued.push(job.id);
            return Ok(Admission::Deferred);
        }

        let servers = self.place(&candidates, &job, job.submission_time, rng);
        Ok(Admission::Placed { servers })
    }

    /// Drains the queue and applies reconfigurations at `time`.
    pub fn update_schedule<R: Rng>(&mut self, time: f64, rng: &mut R) -> SchedulerResult<UpdateReport> {
        self.advance_clock(time)?;
        let mut report = UpdateReport::default();

        let mut free = self.free_servers_from(time);
        let mut still_queued = Vec::with_capacity(self.queued.len());
        for job_id in std::mem::take(&mut self.queued) {
            let job = *self.job(job_id)?;
            if free.len() >= job.min_servers.max(1) {
                self.place(&free, &job, time, rng);
                report.placed += 1;
                free = self.free_servers_from(time);
            } else {
                still_queued.push(job_id);
            }
        }
        self.queued = still_queued;

        if self.features.reconfig_enabled && !free.is_empty() {
            report.reconfigured = self.reconfigure(time, free, rng)?;
        }

        Ok(report)
    }

    /// Servers not held at instant `time`.
    ///
    /// A server is busy only if some task holds it over an open interval
    /// strictly containing `time`; a task's start and end instants count
    /// as free.
    pub fn available_servers(&self, time: f64) -> Vec<Server> {
        let busy: HashSet<Server> = self
            .tasks
            .iter()
            .filter(|t| t.is_running_at(time))
            .flat_map(|t| t.servers_at(time))
            .collect();
        self.servers
            .iter()
            .copied()
            .filter(|s| !busy.contains(s))
            .collect()
    }

    /// Servers free at an instant infinitesimally after `time`.
    ///
    /// Tasks ending exactly at `time` release their servers; tasks starting
    /// exactly at `time` hold theirs.
    pub fn free_servers_from(&self, time: f64) -> Vec<Server> {
        let busy: HashSet<Server> = self
            .tasks
            .iter()
            .filter(|t| t.end_time > time)
            .flat_map(|t| t.servers.iter().copied())
            .collect();
        self.servers
            .iter()
            .copied()
            .filter(|s| !busy.contains(s))
            .collect()
    }

    /// Largest legal server-count increase for `task` given `free` servers.
    pub fn feasible_increase(&self, task: &Task, time: f64, free: usize) -> SchedulerResult<usize> {
        if task.end_time <= time {
            return Ok(0);
        }
        let job = self.job(task.job_id)?;
        let held = task.server_count();
        if held >= job.max_servers {
            Ok(0)
        } else {
            Ok(free.min(job.max_servers - held))
        }
    }

    /// Active tasks with a positive feasible increase, by ascending job id.
    pub fn reconfiguration_candidates(&self, time: f64) -> SchedulerResult<Vec<ReconfigCandidate>> {
        let free = self.free_servers_from(time).len();
        self.candidates_with(time, free)
    }

    fn candidates_with(&self, time: f64, free: usize) -> SchedulerResult<Vec<ReconfigCandidate>> {
        let mut candidates = Vec::new();
        for (index, task) in self.tasks.iter().enumerate() {
            if !task.is_active_at(time) {
                continue;
            }
            let increase = self.feasible_increase(task, time, free)?;
            if increase > 0 {
                candidates.push(ReconfigCandidate {
                    task: index,
                    job_id: task.job_id,
                    increase,
                });
            }
        }
        candidates.sort_by_key(|c| c.job_id);
        Ok(candidates)
    }

    fn reconfigure<R: Rng>(
        &mut self,
        time: f64,
        mut free: Vec<Server>,
        rng: &mut R,
    ) -> SchedulerResult<usize> {
        let pass_free = free.len();
        let share_cap = if self.features.param_enabled {
            ((self.config.reconfig_max_share * pass_free as f64).ceil() as usize).max(1)
        } else {
            usize::MAX
        };

        let mut applied = 0;
        for candidate in self.candidates_with(time, pass_free)? {
            if free.is_empty() {
                break;
            }
            let task = &self.tasks[candidate.task];
            let job = *self.job(task.job_id)?;
            let increase = self.feasible_increase(task, time, free.len())?.min(share_cap);
            if increase == 0 {
                continue;
            }

            let held = task.server_count();
            if self.features.param_enabled {
                let gain = 1.0 - speedup(job.alpha, held) / speedup(job.alpha, held + increase);
                if gain < self.config.reconfig_min_gain {
                    trace!(job = job.id, gain, "reconfiguration below threshold");
                    continue;
                }
            }

            let added: Vec<Server> = free.choose_multiple(rng, increase).copied().collect();
            free.retain(|s| !added.contains(s));
            trace!(job = job.id, held, added = added.len(), time, "task reconfigured");

            let task = &mut self.tasks[candidate.task];
            task.reconfigure(time, added, job.alpha);
            debug_assert!(task.server_count() <= job.max_servers);
            applied += 1;
        }

        self.reconfigurations += applied;
        Ok(applied)
    }

    fn place<R: Rng>(&mut self, candidates: &[Server], job: &Job, time: f64, rng: &mut R) -> usize {
        let count = job.max_servers.min(candidates.len());
        assert!(
            count >= job.min_servers.max(1),
            "job {} is not admissible: {} candidate servers, needs {}",
            job.id,
            candidates.len(),
            job.min_servers
        );
        debug_assert!({
            let free = self.free_servers_from(time);
            candidates.iter().all(|s| free.contains(s))
        });

        let chosen: Vec<Server> = candidates.choose_multiple(rng, count).copied().collect();
        let end = time + job.execution_time(count);
        trace!(job = job.id, servers = count, start = time, end, "job placed");
        self.tasks.push(Task::new(job.id, job.mass, chosen, time, end));
        count
    }

    fn advance_clock(&mut self, time: f64) -> SchedulerResult<()> {
        if time < self.clock {
            return Err(SchedulerError::ClockRegression {
                clock: self.clock,
                requested: time,
            });
        }
        self.clock = time;
        Ok(())
    }
}

#[cfg(test)]
impl Scheduler {
    /// Records a task without admission checks.
    pub(crate) fn push_task_unchecked(&mut self, task: Task) {
        self.tasks.push(task);
    }
}
