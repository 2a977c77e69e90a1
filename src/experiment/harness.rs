//! Simulation driver and experiment harness.
//!
//! # Event loop
//!
//! The driver advances over two event kinds: job arrivals and task
//! completions. At each event time it submits every job arriving at that
//! time, then calls `update_schedule` once. The run ends when no arrival
//! and no completion remains.
//!
//! # Cost
//!
//! `cost = mean_flow_time + energy_weight × energy / job_count`
//!
//! Each run owns a generator seeded from `(seed, run)`, so a batch gives
//! the same statistics whether its runs execute sequentially or on the
//! rayon pool.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WorkloadParams;
use crate::error::ExperimentError;
use crate::models::{Job, Server, Task};
use crate::rng::derived_rng;
use crate::scheduler::{
    energy_report, PowerModel, PowerPolicy, RunKpi, Scheduler, SchedulerConfig, SchedulerFeatures,
};
use crate::validation::validate_jobs;

/// Evaluates a scheduler configuration over repeated randomized runs.
pub trait ExperimentHarness: Send + Sync {
    /// Runs `run_count` simulations of `config` on `server_count` servers.
    ///
    /// Statistics are returned in run order.
    fn run_experiments(
        &self,
        config: &SchedulerConfig,
        server_count: usize,
        run_count: usize,
        seed: u64,
    ) -> Result<Vec<RunStat>, ExperimentError>;
}

/// Workload, power and cost settings shared by every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentParams {
    /// Random workload shape.
    pub workload: WorkloadParams,
    /// Server power draw.
    pub power: PowerModel,
    /// Weight of per-job energy in the cost.
    pub energy_weight: f64,
    /// Event budget of one simulation.
    pub max_events: usize,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            workload: WorkloadParams::default(),
            power: PowerModel::default(),
            energy_weight: 0.1,
            max_events: 100_000,
        }
    }
}

/// Outcome of one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStat {
    /// Run index within its batch.
    pub run: usize,
    /// Jobs submitted.
    pub job_count: usize,
    /// Latest completion time.
    pub makespan: f64,
    /// Mean submission-to-completion time.
    pub mean_flow_time: f64,
    /// Mean submission-to-start time.
    pub mean_wait_time: f64,
    /// Busy share of pool capacity.
    pub utilization: f64,
    /// Total energy.
    pub energy: f64,
    /// Reconfigurations applied.
    pub reconfigurations: usize,
    /// Server power-offs.
    pub power_offs: usize,
    /// Scalar cost minimized by the swarm.
    pub cost: f64,
    /// Final tasks, for Gantt charts.
    #[serde(skip)]
    pub tasks: Vec<Task>,
}

/// The provided [`ExperimentHarness`]: random workloads through [`Scheduler`].
#[derive(Debug, Clone)]
pub struct Experiments {
    params: ExperimentParams,
    features: SchedulerFeatures,
    parallel: bool,
}

impl Experiments {
    /// Creates a harness with default parameters and parallel runs.
    pub fn new(features: SchedulerFeatures) -> Self {
        Self {
            params: ExperimentParams::default(),
            features,
            parallel: true,
        }
    }

    /// Sets the workload, power and cost parameters.
    pub fn with_params(mut self, params: ExperimentParams) -> Self {
        self.params = params;
        self
    }

    /// Enables or disables running the batch on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The shared parameters.
    pub fn params(&self) -> &ExperimentParams {
        &self.params
    }

    /// The scheduler toggles used for every run.
    pub fn features(&self) -> SchedulerFeatures {
        self.features
    }

    /// Runs a single simulation with the generator for `(seed, run)`.
    pub fn run_experiment(
        &self,
        config: &SchedulerConfig,
        server_count: usize,
        run: usize,
        seed: u64,
    ) -> Result<RunStat, ExperimentError> {
        let mut rng = derived_rng(seed, &[run as u64]);
        let jobs = self.params.workload.generate(server_count, &mut rng)?;
        validate_jobs(&jobs, server_count).map_err(ExperimentError::InvalidWorkload)?;

        let scheduler = simulate(
            &jobs,
            server_count,
            config,
            self.features,
            self.params.max_events,
            &mut rng,
        )?;
        let stat = self.summarize(run, &scheduler)?;
        debug!(
            run,
            cost = stat.cost,
            makespan = stat.makespan,
            reconfigurations = stat.reconfigurations,
            power_offs = stat.power_offs,
            "run finished"
        );
        Ok(stat)
    }

    fn summarize(&self, run: usize, scheduler: &Scheduler) -> Result<RunStat, ExperimentError> {
        let kpi = RunKpi::calculate(scheduler)?;
        let policy = PowerPolicy::for_features(self.features, scheduler.config());
        let energy = energy_report(
            scheduler.tasks(),
            scheduler.servers(),
            kpi.makespan,
            &self.params.power,
            policy,
        );
        let job_count = scheduler.jobs().len();
        let per_job_energy = if job_count == 0 {
            0.0
        } else {
            energy.total() / job_count as f64
        };

        Ok(RunStat {
            run,
            job_count,
            makespan: kpi.makespan,
            mean_flow_time: kpi.mean_flow_time,
            mean_wait_time: kpi.mean_wait_time,
            utilization: kpi.utilization,
            energy: energy.total(),
            reconfigurations: scheduler.reconfiguration_count(),
            power_offs: energy.power_offs,
            cost: kpi.mean_flow_time + self.params.energy_weight * per_job_energy,
            tasks: scheduler.tasks().to_vec(),
        })
    }
}

impl ExperimentHarness for Experiments {
    fn run_experiments(
        &self,
        config: &SchedulerConfig,
        server_count: usize,
        run_count: usize,
        seed: u64,
    ) -> Result<Vec<RunStat>, ExperimentError> {
        if self.parallel {
            (0..run_count)
                .into_par_iter()
                .map(|run| self.run_experiment(config, server_count, run, seed))
                .collect()
        } else {
            (0..run_count)
                .map(|run| self.run_experiment(config, server_count, run, seed))
                .collect()
        }
    }
}

/// Drives a scheduler over `jobs` until every job has completed.
///
/// `jobs` must be sorted by submission time.
///
/// # Errors
/// - [`ExperimentError::DidNotTerminate`] after `max_events` events
/// - [`ExperimentError::Stalled`] if jobs stay queued with no event left
/// - [`ExperimentError::Scheduler`] on engine errors
pub fn simulate<R: Rng>(
    jobs: &[Job],
    server_count: usize,
    config: &SchedulerConfig,
    features: SchedulerFeatures,
    max_events: usize,
    rng: &mut R,
) -> Result<Scheduler, ExperimentError> {
    let mut scheduler = Scheduler::new(Server::pool(server_count), *config, features);
    let mut next = 0;
    let mut now = 0.0;
    let mut events = 0;

    loop {
        let arrival = jobs.get(next).map(|j| j.submission_time);
        let completion = scheduler.next_completion_after(now);
        let time = match (arrival, completion) {
            (None, None) => break,
            (Some(a), None) => a,
            (None, Some(c)) => c,
            (Some(a), Some(c)) => a.min(c),
        };

        events += 1;
        if events > max_events {
            return Err(ExperimentError::DidNotTerminate { events: max_events });
        }

        while let Some(job) = jobs.get(next).filter(|j| j.submission_time <= time) {
            scheduler.schedule(*job, rng)?;
            next += 1;
        }
        scheduler.update_schedule(time, rng)?;
        now = time;
    }

    if !scheduler.queued_jobs().is_empty() {
        return Err(ExperimentError::Stalled {
            time: now,
            queued: scheduler.queued_jobs().len(),
        });
    }
    Ok(scheduler)
}
