//! Benchmark suite.
//!
//! Six scheduler variants compared on identical workloads:
//!
//! | Variant | Config | Reconfig | Power-off | Params |
//! |---------|--------|----------|-----------|--------|
//! | `fifo` | default | - | - | - |
//! | `fifo_reconfig` | default | ✓ | - | - |
//! | `fifo_poweroff` | default | - | ✓ | - |
//! | `fifo_reconfig_poweroff` | random | ✓ | ✓ | - |
//! | `random_params` | random | ✓ | ✓ | ✓ |
//! | `swarm_param` | trained or default | ✓ | ✓ | ✓ |
//!
//! The first four reconfigure and power off whenever possible; the last
//! two gate both decisions with the config parameters.

use rand::Rng;
use tracing::info;

use super::{ExperimentHarness, ExperimentParams, Experiments, RunStat};
use crate::error::ExperimentError;
use crate::scheduler::{SchedulerConfig, SchedulerFeatures};

/// One named scheduler setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkVariant {
    /// Output name.
    pub name: &'static str,
    /// Numeric policy.
    pub config: SchedulerConfig,
    /// Policy toggles.
    pub features: SchedulerFeatures,
}

impl BenchmarkVariant {
    /// Runs `run_count` simulations of this variant.
    pub fn run(
        &self,
        params: &ExperimentParams,
        server_count: usize,
        run_count: usize,
        seed: u64,
    ) -> Result<Vec<RunStat>, ExperimentError> {
        info!(variant = self.name, runs = run_count, "running benchmark");
        Experiments::new(self.features)
            .with_params(*params)
            .run_experiments(&self.config, server_count, run_count, seed)
    }
}

/// Builds the six benchmark variants.
///
/// Random configs are drawn from `rng`; `trained` is used for
/// `swarm_param` when present.
pub fn benchmark_suite<R: Rng>(
    trained: Option<SchedulerConfig>,
    rng: &mut R,
) -> Vec<BenchmarkVariant> {
    let eager = SchedulerFeatures::fifo();
    let variant = |name, config, features| BenchmarkVariant {
        name,
        config,
        features,
    };

    vec![
        variant("fifo", SchedulerConfig::default(), eager),
        variant(
            "fifo_reconfig",
            SchedulerConfig::default(),
            eager.with_reconfig(true),
        ),
        variant(
            "fifo_poweroff",
            SchedulerConfig::default(),
            eager.with_power_off(true),
        ),
        variant(
            "fifo_reconfig_poweroff",
            SchedulerConfig::random(rng),
            eager.with_reconfig(true).with_power_off(true),
        ),
        variant(
            "random_params",
            SchedulerConfig::random(rng),
            SchedulerFeatures::all(),
        ),
        variant(
            "swarm_param",
            trained.unwrap_or_default(),
            SchedulerFeatures::all(),
        ),
    ]
}
