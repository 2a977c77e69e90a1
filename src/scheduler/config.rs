//! Scheduler policy parameters.
//!
//! `SchedulerConfig` is the point the swarm searches over. Each tunable
//! has a fixed, named range described by a [`ParamSpec`]; scale-type
//! parameters are sampled and searched in log space.
//!
//! | Parameter | Range | Scale |
//! |-----------|-------|-------|
//! | `reconfig_min_gain` | 0.0 ..= 0.9 | linear |
//! | `reconfig_max_share` | 0.05 ..= 1.0 | linear |
//! | `power_off_idle` | 0.01 ..= 100.0 | log |
//!
//! The parameters only take effect when `param_enabled` is set in the
//! accompanying [`SchedulerFeatures`]; otherwise reconfiguration and
//! power-off happen whenever possible.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of tunable parameters.
pub const PARAM_COUNT: usize = 3;

/// A point in PSO search space (log-scale parameters are stored as `ln`).
pub type Position = [f64; PARAM_COUNT];

/// How a parameter is sampled and searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamScale {
    /// Uniform over `[min, max]`.
    Linear,
    /// Uniform over `[ln min, ln max]`.
    Log,
}

/// Name and range of one tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, as used in records.
    pub name: &'static str,
    /// Smallest allowed value.
    pub min: f64,
    /// Largest allowed value.
    pub max: f64,
    /// Sampling/search scale.
    pub scale: ParamScale,
}

impl ParamSpec {
    /// Maps a natural value into search space.
    pub fn to_search(&self, value: f64) -> f64 {
        match self.scale {
            ParamScale::Linear => value,
            ParamScale::Log => value.ln(),
        }
    }

    /// Maps a search-space coordinate back to a natural value.
    pub fn from_search(&self, coordinate: f64) -> f64 {
        match self.scale {
            ParamScale::Linear => coordinate,
            ParamScale::Log => coordinate.exp(),
        }
    }

    /// Search-space bounds.
    pub fn search_bounds(&self) -> (f64, f64) {
        (self.to_search(self.min), self.to_search(self.max))
    }

    /// Width of the search-space interval.
    pub fn search_span(&self) -> f64 {
        let (lo, hi) = self.search_bounds();
        hi - lo
    }

    /// Clamps a natural value into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Draws a value uniformly in search space.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = self.search_bounds();
        self.clamp(self.from_search(rng.random_range(lo..=hi)))
    }
}

/// Parameter table, in record order.
pub const PARAM_SPECS: [ParamSpec; PARAM_COUNT] = [
    ParamSpec {
        name: "reconfig_min_gain",
        min: 0.0,
        max: 0.9,
        scale: ParamScale::Linear,
    },
    ParamSpec {
        name: "reconfig_max_share",
        min: 0.05,
        max: 1.0,
        scale: ParamScale::Linear,
    },
    ParamSpec {
        name: "power_off_idle",
        min: 0.01,
        max: 100.0,
        scale: ParamScale::Log,
    },
];

/// Numeric scheduling policy.
///
/// Field order matches [`PARAM_SPECS`] and is the serialized column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum relative reduction of a task's remaining duration for a
    /// reconfiguration to be applied.
    pub reconfig_min_gain: f64,
    /// Largest share of the free pool a single task may receive in one
    /// reconfiguration pass.
    pub reconfig_max_share: f64,
    /// Idle time after which a server is powered off.
    pub power_off_idle: f64,
}

impl Default for SchedulerConfig {
    /// The eager policy: reconfigure and power off whenever possible.
    fn default() -> Self {
        Self {
            reconfig_min_gain: 0.0,
            reconfig_max_share: 1.0,
            power_off_idle: 0.01,
        }
    }
}

impl SchedulerConfig {
    /// Draws every parameter independently from its range.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::from_values(PARAM_SPECS.map(|spec| spec.sample(rng)))
    }

    /// Natural parameter values, in record order.
    pub fn values(&self) -> [f64; PARAM_COUNT] {
        [
            self.reconfig_min_gain,
            self.reconfig_max_share,
            self.power_off_idle,
        ]
    }

    /// Builds a config from natural values, clamping each into range.
    pub fn from_values(values: [f64; PARAM_COUNT]) -> Self {
        Self {
            reconfig_min_gain: PARAM_SPECS[0].clamp(values[0]),
            reconfig_max_share: PARAM_SPECS[1].clamp(values[1]),
            power_off_idle: PARAM_SPECS[2].clamp(values[2]),
        }
    }

    /// Flat `(name, value)` record with a stable key order.
    pub fn to_record(&self) -> Vec<(&'static str, f64)> {
        PARAM_SPECS
            .iter()
            .zip(self.values())
            .map(|(spec, value)| (spec.name, value))
            .collect()
    }

    /// Coordinates in PSO search space.
    pub fn to_position(&self) -> Position {
        let values = self.values();
        let mut position = [0.0; PARAM_COUNT];
        for (d, spec) in PARAM_SPECS.iter().enumerate() {
            position[d] = spec.to_search(values[d]);
        }
        position
    }

    /// Builds a config from search-space coordinates, clamping into range.
    pub fn from_position(position: &Position) -> Self {
        let mut values = [0.0; PARAM_COUNT];
        for (d, spec) in PARAM_SPECS.iter().enumerate() {
            values[d] = spec.from_search(position[d]);
        }
        Self::from_values(values)
    }
}

/// Policy toggles passed alongside a [`SchedulerConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerFeatures {
    /// Grow running tasks onto free servers.
    pub reconfig_enabled: bool,
    /// Power idle servers off.
    pub power_off_enabled: bool,
    /// Gate reconfiguration and power-off with the config parameters.
    pub param_enabled: bool,
}

impl SchedulerFeatures {
    /// Plain FIFO: no reconfiguration, no power-off.
    pub fn fifo() -> Self {
        Self::default()
    }

    /// Every feature enabled.
    pub fn all() -> Self {
        Self {
            reconfig_enabled: true,
            power_off_enabled: true,
            param_enabled: true,
        }
    }

    /// Sets the reconfiguration toggle.
    pub fn with_reconfig(mut self, enabled: bool) -> Self {
        self.reconfig_enabled = enabled;
        self
    }

    /// Sets the power-off toggle.
    pub fn with_power_off(mut self, enabled: bool) -> Self {
        self.power_off_enabled = enabled;
        self
    }

    /// Sets the parameter-gating toggle.
    pub fn with_params(mut self, enabled: bool) -> Self {
        self.param_enabled = enabled;
        self
    }
}
