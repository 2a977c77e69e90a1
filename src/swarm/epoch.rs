//! Per-epoch cost summary.

use serde::{Deserialize, Serialize};

use crate::error::SwarmError;

/// Cost statistics over the particles of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochCost {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Lowest particle cost.
    pub min: f64,
    /// Highest particle cost.
    pub max: f64,
    /// Mean particle cost.
    pub mean: f64,
    /// Sample standard deviation of the costs.
    pub std: f64,
}

impl EpochCost {
    /// Summarizes `costs`.
    ///
    /// When every cost is identical, `mean` is that value and `std` is
    /// exactly zero.
    ///
    /// # Errors
    /// [`SwarmError::InsufficientSamples`] for fewer than two costs.
    pub fn from_costs(epoch: usize, costs: &[f64]) -> Result<Self, SwarmError> {
        if costs.len() < 2 {
            return Err(SwarmError::InsufficientSamples(costs.len()));
        }
        let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min == max {
            return Ok(Self {
                epoch,
                min,
                max,
                mean: min,
                std: 0.0,
            });
        }

        let n = costs.len() as f64;
        let mean = costs.iter().sum::<f64>() / n;
        let variance = costs.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Ok(Self {
            epoch,
            min,
            max,
            mean,
            std: variance.sqrt(),
        })
    }
}
