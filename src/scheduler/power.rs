//! Power and energy accounting.
//!
//! Energy is derived after a run from the servers' busy spans. Every
//! server is powered from t=0 to the run horizon (the makespan) and is
//! in one of three states: busy, idle, or off.
//!
//! Under [`PowerPolicy::OffAfterIdle`] a server whose idle gap exceeds
//! the threshold stays idle for the threshold, then switches off and
//! pays `switch_energy` for the off/on cycle. This is the classic
//! ski-rental trade-off: a short threshold saves idle power on long
//! gaps but pays the switch cost on gaps that were almost over.
//!
//! # Reference
//! Irani, Shukla & Gupta (2007), "Algorithms for power savings"

use serde::{Deserialize, Serialize};

use super::{SchedulerConfig, SchedulerFeatures};
use crate::models::{Server, Task};

/// Power draw of a server in each state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerModel {
    /// Power while working.
    pub busy_power: f64,
    /// Power while idle but on.
    pub idle_power: f64,
    /// Energy of one off/on cycle.
    pub switch_energy: f64,
}

impl Default for PowerModel {
    fn default() -> Self {
        Self {
            busy_power: 1.0,
            idle_power: 0.4,
            switch_energy: 2.0,
        }
    }
}

/// When idle servers are switched off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerPolicy {
    /// Servers never switch off.
    AlwaysOn,
    /// Servers switch off once idle for the given time.
    OffAfterIdle(f64),
}

impl PowerPolicy {
    /// Derives the policy from the feature toggles and parameters.
    pub fn for_features(features: SchedulerFeatures, config: &SchedulerConfig) -> Self {
        match (features.power_off_enabled, features.param_enabled) {
            (false, _) => PowerPolicy::AlwaysOn,
            (true, false) => PowerPolicy::OffAfterIdle(0.0),
            (true, true) => PowerPolicy::OffAfterIdle(config.power_off_idle),
        }
    }
}

/// Energy spent by a pool over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyReport {
    /// Energy spent working.
    pub busy: f64,
    /// Energy spent idle.
    pub idle: f64,
    /// Energy spent on off/on cycles.
    pub switching: f64,
    /// Number of power-offs.
    pub power_offs: usize,
}

impl EnergyReport {
    /// Total energy.
    pub fn total(&self) -> f64 {
        self.busy + self.idle + self.switching
    }

    fn add_gap(&mut self, gap: f64, model: &PowerModel, policy: PowerPolicy) {
        if gap <= 0.0 {
            return;
        }
        match policy {
            PowerPolicy::OffAfterIdle(threshold) if gap > threshold => {
                self.idle += threshold * model.idle_power;
                self.switching += model.switch_energy;
                self.power_offs += 1;
            }
            _ => self.idle += gap * model.idle_power,
        }
    }
}

/// Computes the energy spent by `servers` running `tasks` over `[0, horizon]`.
pub fn energy_report(
    tasks: &[Task],
    servers: &[Server],
    horizon: f64,
    model: &PowerModel,
    policy: PowerPolicy,
) -> EnergyReport {
    let mut report = EnergyReport::default();
    let spans: Vec<_> = tasks.iter().flat_map(|t| t.busy_spans()).collect();

    for &server in servers {
        let mut own: Vec<(f64, f64)> = spans
            .iter()
            .filter(|s| s.server == server)
            .map(|s| (s.start, s.end))
            .collect();
        own.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut cursor = 0.0;
        for (start, end) in own {
            report.add_gap(start - cursor, model, policy);
            report.busy += (end - start) * model.busy_power;
            cursor = end;
        }
        report.add_gap(horizon - cursor, model, policy);
    }

    report
}
