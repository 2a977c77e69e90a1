//! Training and benchmark workflows.
//!
//! Output layout under the results directory:
//!
//! ```text
//! swarm_training/seed_<s>/
//!     swarm_costs.csv
//!     swarm_best_config.csv
//!     swarm_cost_graph.svg
//!     epoch_<e>/particle-<i>-exp-<j>.svg
//! benchmarking_experiments/seed_<s>/
//!     <variant>.csv
//! ```

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::error::{Error, SettingsError};
use crate::experiment::{benchmark_suite, Experiments};
use crate::report::{draw_cost_graph, draw_gantt, read_csv, write_csv};
use crate::scheduler::{SchedulerConfig, SchedulerFeatures};
use crate::settings::AppConfig;
use crate::swarm::{EpochCost, Swarm};

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Cost summary of every epoch.
    pub costs: Vec<EpochCost>,
    /// Best configuration found and its cost.
    pub best: Option<(SchedulerConfig, f64)>,
    /// Directory the outputs were written to.
    pub output_dir: PathBuf,
}

/// Mean metrics of one benchmark variant.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSummary {
    /// Variant name, also the CSV file stem.
    pub name: &'static str,
    /// Mean run cost.
    pub mean_cost: f64,
    /// Mean of the per-run mean flow times.
    pub mean_flow_time: f64,
    /// Mean total energy per run.
    pub mean_energy: f64,
}

/// Trains a swarm and writes its costs, best config and charts.
pub fn train_swarm(config: &AppConfig, output: &Path) -> Result<TrainingOutcome, Error> {
    let settings = config.swarm;
    let dir = output
        .join("swarm_training")
        .join(format!("seed_{}", settings.seed));
    let harness = Experiments::new(SchedulerFeatures::all()).with_params(config.experiment);
    let mut swarm = Swarm::new(
        settings.seed,
        settings.particle_count,
        settings.server_count,
        settings.experiments_per_particle,
        harness,
    )?
    .with_pso(settings.pso);

    info!(
        seed = settings.seed,
        particles = settings.particle_count,
        epochs = settings.epoch_count,
        "training swarm"
    );
    let costs = swarm.run_epochs_with(settings.epoch_count, |epoch, particle, stats| {
        if !settings.draw_particle_gantt {
            return;
        }
        for (j, stat) in stats.iter().enumerate() {
            let path = dir
                .join(format!("epoch_{epoch}"))
                .join(format!("particle-{particle}-exp-{j}.svg"));
            if let Err(e) = draw_gantt(stat, settings.server_count, &path) {
                warn!(path = %path.display(), error = %e, "failed to draw gantt chart");
            }
        }
    })?;

    write_csv(&costs, dir.join("swarm_costs.csv"))?;
    let best = swarm.best();
    if let Some((best_config, cost)) = best {
        info!(cost, ?best_config, "best configuration");
        write_csv(&[best_config], dir.join("swarm_best_config.csv"))?;
    }
    if settings.draw_cost_graph {
        draw_cost_graph(&costs, dir.join("swarm_cost_graph.svg"))?;
    }

    Ok(TrainingOutcome {
        costs,
        best,
        output_dir: dir,
    })
}

/// Reads the first configuration from a `swarm_best_config.csv` file.
pub fn load_trained_config(path: &Path) -> Result<SchedulerConfig, Error> {
    let configs: Vec<SchedulerConfig> = read_csv(path)?;
    configs.into_iter().next().ok_or_else(|| {
        SettingsError::Invalid(format!("{} holds no configuration", path.display())).into()
    })
}

/// Runs the six benchmark variants and writes one CSV per variant.
///
/// `trained` overrides `benchmarks.trained_config` for `swarm_param`.
pub fn run_benchmarks(
    config: &AppConfig,
    output: &Path,
    trained: Option<SchedulerConfig>,
) -> Result<Vec<BenchmarkSummary>, Error> {
    let settings = config.benchmarks;
    let dir = output
        .join("benchmarking_experiments")
        .join(format!("seed_{}", settings.seed));
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let suite = benchmark_suite(trained.or(settings.trained_config), &mut rng);

    let mut summaries = Vec::with_capacity(suite.len());
    for variant in &suite {
        let stats = variant.run(
            &config.experiment,
            settings.server_count,
            settings.experiments_count,
            settings.seed,
        )?;
        write_csv(&stats, dir.join(format!("{}.csv", variant.name)))?;

        let n = stats.len().max(1) as f64;
        let summary = BenchmarkSummary {
            name: variant.name,
            mean_cost: stats.iter().map(|s| s.cost).sum::<f64>() / n,
            mean_flow_time: stats.iter().map(|s| s.mean_flow_time).sum::<f64>() / n,
            mean_energy: stats.iter().map(|s| s.energy).sum::<f64>() / n,
        };
        info!(
            variant = variant.name,
            mean_cost = summary.mean_cost,
            mean_flow_time = summary.mean_flow_time,
            mean_energy = summary.mean_energy,
            "benchmark finished"
        );
        summaries.push(summary);
    }
    Ok(summaries)
}
