//! YAML configuration.
//!
//! ```yaml
//! swarm:
//!   seed: 0
//!   server_count: 10
//!   particle_count: 10
//!   epoch_count: 10
//!   experiments_per_particle: 10
//!   draw_particle_gantt: false
//!   draw_cost_graph: true
//! benchmarks:
//!   seed: 0
//!   server_count: 10
//!   experiments_count: 10
//!   trained_config:            # optional
//!     reconfig_min_gain: 0.2
//!     reconfig_max_share: 0.5
//!     power_off_idle: 3.0
//! experiment:                  # optional
//!   workload: { job_count: 40, mean_interarrival: 1.5 }
//!   power: { busy_power: 1.0, idle_power: 0.4, switch_energy: 2.0 }
//!   energy_weight: 0.1
//!   max_events: 100000
//! ```
//!
//! Every key is optional and falls back to the values above. Unknown keys
//! are rejected. The upper-case names `SEED`, `SERVER_COUNT`,
//! `PARTICLE_COUNT`, `EPOCH_COUNT` and `EXPTS_COUNT` are accepted as
//! aliases.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::experiment::ExperimentParams;
use crate::scheduler::SchedulerConfig;
use crate::swarm::PsoParams;

/// Swarm training settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmSettings {
    /// Base seed for the population and every epoch's workloads.
    #[serde(alias = "SEED")]
    pub seed: u64,
    /// Servers in each simulated pool.
    #[serde(alias = "SERVER_COUNT")]
    pub server_count: usize,
    /// Particles in the swarm (at least 2).
    #[serde(alias = "PARTICLE_COUNT")]
    pub particle_count: usize,
    /// Epochs to run.
    #[serde(alias = "EPOCH_COUNT")]
    pub epoch_count: usize,
    /// Simulations averaged into one particle cost.
    #[serde(alias = "num_exp")]
    pub experiments_per_particle: usize,
    /// Write a Gantt chart for every run of every particle.
    pub draw_particle_gantt: bool,
    /// Write the min/mean/max cost graph after training.
    pub draw_cost_graph: bool,
    /// Velocity update coefficients.
    pub pso: PsoParams,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            server_count: 10,
            particle_count: 10,
            epoch_count: 10,
            experiments_per_particle: 10,
            draw_particle_gantt: false,
            draw_cost_graph: true,
            pso: PsoParams::default(),
        }
    }
}

/// Benchmark suite settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkSettings {
    /// Seed shared by every variant, so all see the same workloads.
    #[serde(alias = "SEED")]
    pub seed: u64,
    /// Servers in each simulated pool.
    #[serde(alias = "SERVER_COUNT")]
    pub server_count: usize,
    /// Simulations per variant.
    #[serde(alias = "expts_count", alias = "EXPTS_COUNT")]
    pub experiments_count: usize,
    /// Configuration for the `swarm_param` variant.
    pub trained_config: Option<SchedulerConfig>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            server_count: 10,
            experiments_count: 10,
            trained_config: None,
        }
    }
}

/// Root of the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `train-swarm` settings.
    pub swarm: SwarmSettings,
    /// `run-benchmarks` settings.
    pub benchmarks: BenchmarkSettings,
    /// Workload, power and cost parameters shared by both modes.
    pub experiment: ExperimentParams,
}

impl AppConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));
        if self.swarm.particle_count < 2 {
            return invalid("swarm.particle_count must be at least 2");
        }
        if self.swarm.experiments_per_particle == 0 {
            return invalid("swarm.experiments_per_particle must be positive");
        }
        if self.swarm.server_count == 0 || self.benchmarks.server_count == 0 {
            return invalid("server_count must be positive");
        }
        if self.benchmarks.experiments_count == 0 {
            return invalid("benchmarks.experiments_count must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.experiment.workload.job_count, 40);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = "
swarm:
  seed: 7
  particle_count: 4
  num_exp: 3
benchmarks:
  expts_count: 5
  trained_config:
    reconfig_min_gain: 0.2
    reconfig_max_share: 0.5
    power_off_idle: 3.0
experiment:
  workload:
    job_count: 12
  energy_weight: 0.5
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.swarm.seed, 7);
        assert_eq!(config.swarm.particle_count, 4);
        assert_eq!(config.swarm.experiments_per_particle, 3);
        assert_eq!(config.swarm.epoch_count, 10);
        assert_eq!(config.benchmarks.experiments_count, 5);
        let trained = config.benchmarks.trained_config.unwrap();
        assert!((trained.power_off_idle - 3.0).abs() < 1e-12);
        assert_eq!(config.experiment.workload.job_count, 12);
        assert!((config.experiment.workload.mean_interarrival - 1.5).abs() < 1e-12);
        assert!((config.experiment.energy_weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            AppConfig::from_yaml("swarm: { particle_count: 1 }"),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("swarm: [1, 2]"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppConfig::load(dir.path().join("config.yml")),
            Err(SettingsError::Read { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for yaml in [
            "swarm:\n  particle_cout: 2\n",
            "benchmarks:\n  experiment_count: 3\n",
            "experiment:\n  workload:\n    jobs: 3\n",
            "swarms:\n  seed: 1\n",
        ] {
            assert!(
                matches!(AppConfig::from_yaml(yaml), Err(SettingsError::Parse(_))),
                "accepted {yaml:?}"
            );
        }
    }

    #[test]
    fn test_upper_case_aliases() {
        let yaml = "
swarm:
  SEED: 5
  SERVER_COUNT: 6
  PARTICLE_COUNT: 3
  EPOCH_COUNT: 4
benchmarks:
  SEED: 9
  EXPTS_COUNT: 2
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.swarm.seed, 5);
        assert_eq!(config.swarm.server_count, 6);
        assert_eq!(config.swarm.particle_count, 3);
        assert_eq!(config.swarm.epoch_count, 4);
        assert_eq!(config.benchmarks.seed, 9);
        assert_eq!(config.benchmarks.experiments_count, 2);
    }
}
