//! Particle-swarm optimizer over scheduler configurations.
//!
//! # Epoch
//!
//! 1. Every particle is evaluated through the harness (in parallel on
//!    the rayon pool unless disabled). All particles of an epoch share
//!    one seed, so they are compared on identical workloads.
//! 2. After every evaluation has joined, the stat handler is called in
//!    particle order, costs are recorded and the epoch's best particle
//!    (lowest cost, earliest index on ties) becomes the global best.
//! 3. Every particle moves toward its personal best and the global best.
//!
//! If any evaluation fails the epoch is aborted before any particle is
//! updated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use super::{EpochCost, Particle, PsoParams};
use crate::error::{ExperimentError, SwarmError};
use crate::experiment::{ExperimentHarness, RunStat};
use crate::rng::derive_seed;
use crate::scheduler::SchedulerConfig;

/// A population of particles evolving over epochs.
pub struct Swarm<H: ExperimentHarness> {
    seed: u64,
    server_count: usize,
    runs_per_particle: usize,
    harness: H,
    pso: PsoParams,
    population: Vec<Particle>,
    rng: ChaCha8Rng,
    best: Option<(SchedulerConfig, f64)>,
    epochs_run: usize,
    cancel: Option<Arc<AtomicBool>>,
    parallel: bool,
}

impl<H: ExperimentHarness> Swarm<H> {
    /// Creates a swarm of `particle_count` random configurations.
    ///
    /// # Errors
    /// - [`SwarmError::TooFewParticles`] if `particle_count < 2`
    /// - [`SwarmError::NoExperiments`] if `runs_per_particle == 0`
    pub fn new(
        seed: u64,
        particle_count: usize,
        server_count: usize,
        runs_per_particle: usize,
        harness: H,
    ) -> Result<Self, SwarmError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let configs = (0..particle_count)
            .map(|_| SchedulerConfig::random(&mut rng))
            .collect();
        Self::with_rng(seed, configs, server_count, runs_per_particle, harness, rng)
    }

    /// Creates a swarm starting from explicit configurations.
    pub fn from_configs(
        seed: u64,
        configs: Vec<SchedulerConfig>,
        server_count: usize,
        runs_per_particle: usize,
        harness: H,
    ) -> Result<Self, SwarmError> {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Self::with_rng(seed, configs, server_count, runs_per_particle, harness, rng)
    }

    fn with_rng(
        seed: u64,
        configs: Vec<SchedulerConfig>,
        server_count: usize,
        runs_per_particle: usize,
        harness: H,
        rng: ChaCha8Rng,
    ) -> Result<Self, SwarmError> {
        if configs.len() < 2 {
            return Err(SwarmError::TooFewParticles(configs.len()));
        }
        if runs_per_particle == 0 {
            return Err(SwarmError::NoExperiments);
        }
        Ok(Self {
            seed,
            server_count,
            runs_per_particle,
            harness,
            pso: PsoParams::default(),
            population: configs.into_iter().map(Particle::new).collect(),
            rng,
            best: None,
            epochs_run: 0,
            cancel: None,
            parallel: true,
        })
    }

    /// Sets the PSO coefficients.
    pub fn with_pso(mut self, pso: PsoParams) -> Self {
        self.pso = pso;
        self
    }

    /// Installs a cancellation flag, checked before every epoch.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Enables or disables parallel particle evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The particles, in index order.
    pub fn population(&self) -> &[Particle] {
        &self.population
    }

    /// Best configuration and cost over all completed epochs.
    pub fn best(&self) -> Option<(SchedulerConfig, f64)> {
        self.best
    }

    /// Number of completed epochs.
    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Base seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs up to `epochs` epochs.
    pub fn run_epochs(&mut self, epochs: usize) -> Result<Vec<EpochCost>, SwarmError> {
        self.run_epochs_with(epochs, |_, _, _| {})
    }

    /// Runs up to `epochs` epochs, passing every particle's run statistics
    /// to `handler(epoch, particle, stats)`.
    ///
    /// Stops early, after the in-flight epoch, when the cancellation flag
    /// is raised.
    pub fn run_epochs_with<F>(
        &mut self,
        epochs: usize,
        mut handler: F,
    ) -> Result<Vec<EpochCost>, SwarmError>
    where
        F: FnMut(usize, usize, &[RunStat]),
    {
        let mut costs = Vec::with_capacity(epochs);
        for i in 0..epochs {
            if self.is_cancelled() {
                info!(completed = costs.len(), "swarm cancelled");
                break;
            }
            info!(epoch = i + 1, of = epochs, "running epoch");
            costs.push(self.run_epoch(&mut handler)?);
        }
        Ok(costs)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn run_epoch<F>(&mut self, handler: &mut F) -> Result<EpochCost, SwarmError>
    where
        F: FnMut(usize, usize, &[RunStat]),
    {
        let epoch = self.epochs_run;
        let seed = derive_seed(self.seed, &[epoch as u64]);

        let results: Vec<Vec<RunStat>> = if self.parallel {
            self.population
                .par_iter()
                .enumerate()
                .map(|(index, particle)| self.evaluate(epoch, index, particle, seed))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.population
                .iter()
                .enumerate()
                .map(|(index, particle)| self.evaluate(epoch, index, particle, seed))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut costs = Vec::with_capacity(results.len());
        for (index, stats) in results.iter().enumerate() {
            handler(epoch, index, stats);
            costs.push(stats.iter().map(|s| s.cost).sum::<f64>() / stats.len() as f64);
        }

        let mut best_index = 0;
        for (index, &cost) in costs.iter().enumerate() {
            if cost < costs[best_index] {
                best_index = index;
            }
        }
        let global_best = *self.population[best_index].config();
        let best_cost = costs[best_index];
        match self.best {
            Some((_, cost)) if best_cost >= cost => {}
            _ => self.best = Some((global_best, best_cost)),
        }

        for (particle, &cost) in self.population.iter_mut().zip(&costs) {
            particle.update_cost(cost);
            particle.update_position(&global_best, &self.pso, &mut self.rng);
        }

        let summary = EpochCost::from_costs(epoch, &costs)?;
        info!(
            epoch,
            min = summary.min,
            mean = summary.mean,
            max = summary.max,
            best_particle = best_index,
            "epoch finished"
        );
        self.epochs_run += 1;
        Ok(summary)
    }

    fn evaluate(
        &self,
        epoch: usize,
        index: usize,
        particle: &Particle,
        seed: u64,
    ) -> Result<Vec<RunStat>, SwarmError> {
        debug!(epoch, particle = index, "evaluating particle");
        self.harness
            .run_experiments(
                particle.config(),
                self.server_count,
                self.runs_per_particle,
                seed,
            )
            .and_then(|stats| {
                if stats.is_empty() {
                    Err(ExperimentError::NoRuns)
                } else {
                    Ok(stats)
                }
            })
            .map_err(|source| SwarmError::Evaluation {
                epoch,
                particle: index,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExperimentError;
    use crate::experiment::{ExperimentParams, Experiments, WorkloadParams};
    use crate::scheduler::SchedulerFeatures;

    /// Cost is the distance to a fixed target configuration.
    struct Quadratic;

    impl ExperimentHarness for Quadratic {
        fn run_experiments(
            &self,
            config: &SchedulerConfig,
            _server_count: usize,
            run_count: usize,
            _seed: u64,
        ) -> Result<Vec<RunStat>, ExperimentError> {
            let cost = (config.reconfig_min_gain - 0.3).powi(2)
                + (config.reconfig_max_share - 0.6).powi(2)
                + (config.power_off_idle.ln() - 1.0).powi(2);
            Ok((0..run_count).map(|run| stat(run, cost)).collect())
        }
    }

    /// Returns no runs at all.
    struct Empty;

    impl ExperimentHarness for Empty {
        fn run_experiments(
            &self,
            _config: &SchedulerConfig,
            _server_count: usize,
            _run_count: usize,
            _seed: u64,
        ) -> Result<Vec<RunStat>, ExperimentError> {
            Ok(Vec::new())
        }
    }

    /// Fails for one particle configuration.
    struct Failing;

    impl ExperimentHarness for Failing {
        fn run_experiments(
            &self,
            config: &SchedulerConfig,
            _server_count: usize,
            _run_count: usize,
            _seed: u64,
        ) -> Result<Vec<RunStat>, ExperimentError> {
            if config.reconfig_min_gain > 0.5 {
                Err(ExperimentError::InvalidParameters("boom".into()))
            } else {
                Ok(vec![stat(0, 1.0)])
            }
        }
    }

    fn stat(run: usize, cost: f64) -> RunStat {
        RunStat {
            run,
            job_count: 1,
            makespan: 0.0,
            mean_flow_time: cost,
            mean_wait_time: 0.0,
            utilization: 0.0,
            energy: 0.0,
            reconfigurations: 0,
            power_offs: 0,
            cost,
            tasks: Vec::new(),
        }
    }

    fn config(gain: f64) -> SchedulerConfig {
        SchedulerConfig {
            reconfig_min_gain: gain,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_too_few_particles() {
        assert!(matches!(
            Swarm::new(1, 1, 4, 2, Quadratic),
            Err(SwarmError::TooFewParticles(1))
        ));
        assert!(matches!(
            Swarm::new(1, 3, 4, 0, Quadratic),
            Err(SwarmError::NoExperiments)
        ));
    }

    #[test]
    fn test_seeded_population() {
        let a = Swarm::new(5, 4, 4, 1, Quadratic).unwrap();
        let b = Swarm::new(5, 4, 4, 1, Quadratic).unwrap();
        for (pa, pb) in a.population().iter().zip(b.population()) {
            assert_eq!(pa.config(), pb.config());
        }
        assert_ne!(a.population()[0].config(), a.population()[1].config());
    }

    #[test]
    fn test_identical_configs_have_zero_spread() {
        let params = ExperimentParams {
            workload: WorkloadParams::default().with_job_count(12),
            ..ExperimentParams::default()
        };
        let harness = Experiments::new(SchedulerFeatures::all()).with_params(params);
        let configs = vec![SchedulerConfig::default(); 3];
        let mut swarm = Swarm::from_configs(3, configs, 4, 3, harness).unwrap();
        let costs = swarm.run_epochs(1).unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].std, 0.0);
        assert_eq!(costs[0].min, costs[0].max);
        assert_eq!(costs[0].mean, costs[0].min);
    }

    #[test]
    fn test_best_never_worsens() {
        let mut swarm = Swarm::new(11, 6, 4, 2, Quadratic).unwrap();
        let costs = swarm.run_epochs(25).unwrap();
        assert_eq!(costs.len(), 25);
        assert_eq!(swarm.epochs_run(), 25);
        let (_, best) = swarm.best().unwrap();
        let overall_min = costs.iter().map(|c| c.min).fold(f64::INFINITY, f64::min);
        assert!((best - overall_min).abs() < 1e-12);
        assert!(best <= costs[0].min);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut par = Swarm::new(8, 4, 4, 2, Quadratic).unwrap();
        let mut seq = Swarm::new(8, 4, 4, 2, Quadratic).unwrap().with_parallel(false);
        assert_eq!(par.run_epochs(5).unwrap(), seq.run_epochs(5).unwrap());
    }

    #[test]
    fn test_handler_called_in_order() {
        let mut swarm = Swarm::new(2, 3, 4, 2, Quadratic).unwrap();
        let mut calls = Vec::new();
        swarm
            .run_epochs_with(2, |epoch, particle, stats| {
                calls.push((epoch, particle, stats.len()))
            })
            .unwrap();
        assert_eq!(
            calls,
            vec![
                (0, 0, 2),
                (0, 1, 2),
                (0, 2, 2),
                (1, 0, 2),
                (1, 1, 2),
                (1, 2, 2)
            ]
        );
    }

    #[test]
    fn test_evaluation_failure_aborts_epoch() {
        let configs = vec![config(0.1), config(0.8), config(0.2)];
        let mut swarm = Swarm::from_configs(1, configs, 4, 1, Failing).unwrap();
        let result = swarm.run_epochs(3);
        assert!(matches!(
            result,
            Err(SwarmError::Evaluation {
                epoch: 0,
                particle: 1,
                ..
            })
        ));
        assert_eq!(swarm.epochs_run(), 0);
        assert!(swarm.best().is_none());
        assert!(swarm.population().iter().all(|p| p.cost().is_none()));
    }

    #[test]
    fn test_cancel_before_start() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut swarm = Swarm::new(1, 2, 4, 1, Quadratic)
            .unwrap()
            .with_cancel_flag(flag);
        assert!(swarm.run_epochs(5).unwrap().is_empty());
        assert_eq!(swarm.epochs_run(), 0);
    }

    #[test]
    fn test_cancel_finishes_inflight_epoch() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut swarm = Swarm::new(1, 2, 4, 1, Quadratic)
            .unwrap()
            .with_cancel_flag(flag.clone());
        let costs = swarm
            .run_epochs_with(5, |_, _, _| flag.store(true, Ordering::Relaxed))
            .unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(swarm.epochs_run(), 1);
    }

    #[test]
    fn test_empty_run_batch_is_an_error() {
        let mut swarm = Swarm::new(4, 3, 4, 2, Empty).unwrap();
        assert!(matches!(
            swarm.run_epochs(1),
            Err(SwarmError::Evaluation {
                epoch: 0,
                source: ExperimentError::NoRuns,
                ..
            })
        ));
        assert_eq!(swarm.epochs_run(), 0);
        assert!(swarm.best().is_none());
    }
}
