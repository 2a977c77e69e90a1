//! PSO particle.
//!
//! A particle carries one scheduler configuration through search space.
//! Log-scale parameters move in `ln` space so a step has the same
//! relative effect anywhere in their range.
//!
//! # Update rule
//!
//! ```text
//! v ← w·v + c1·r1·(pbest − x) + c2·r2·(gbest − x)
//! v ← clamp(v, ±max_velocity·span)
//! x ← clamp(x + v, range)
//! ```
//!
//! `r1`, `r2` are drawn uniformly in `[0, 1)` per dimension.
//!
//! # Reference
//! Shi & Eberhart (1998), "A modified particle swarm optimizer"

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::scheduler::{Position, SchedulerConfig, PARAM_COUNT, PARAM_SPECS};

/// PSO coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsoParams {
    /// Inertia weight `w`.
    pub inertia: f64,
    /// Attraction to the personal best `c1`.
    pub cognitive: f64,
    /// Attraction to the global best `c2`.
    pub social: f64,
    /// Velocity limit as a fraction of each dimension's span.
    pub max_velocity: f64,
}

impl Default for PsoParams {
    fn default() -> Self {
        Self {
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            max_velocity: 0.5,
        }
    }
}

impl PsoParams {
    /// Sets the inertia weight.
    pub fn with_inertia(mut self, inertia: f64) -> Self {
        self.inertia = inertia;
        self
    }

    /// Sets the cognitive and social coefficients.
    pub fn with_coefficients(mut self, cognitive: f64, social: f64) -> Self {
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Sets the velocity limit.
    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity;
        self
    }
}

/// A swarm member.
#[derive(Debug, Clone)]
pub struct Particle {
    config: SchedulerConfig,
    position: Position,
    velocity: Position,
    cost: Option<f64>,
    best_position: Position,
    best_cost: Option<f64>,
}

impl Particle {
    /// Creates a particle at `config` with zero velocity.
    pub fn new(config: SchedulerConfig) -> Self {
        let position = config.to_position();
        Self {
            config,
            position,
            velocity: [0.0; PARAM_COUNT],
            cost: None,
            best_position: position,
            best_cost: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Current search-space position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> &Position {
        &self.velocity
    }

    /// Cost of the last evaluation.
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    /// Best configuration seen by this particle and its cost.
    pub fn personal_best(&self) -> Option<(SchedulerConfig, f64)> {
        self.best_cost
            .map(|cost| (SchedulerConfig::from_position(&self.best_position), cost))
    }

    /// Records the cost of the current configuration.
    pub fn update_cost(&mut self, cost: f64) {
        self.cost = Some(cost);
        match self.best_cost {
            Some(best) if cost >= best => {}
            _ => {
                self.best_cost = Some(cost);
                self.best_position = self.position;
            }
        }
    }

    /// Moves the particle toward its personal best and `global_best`.
    pub fn update_position<R: Rng>(
        &mut self,
        global_best: &SchedulerConfig,
        pso: &PsoParams,
        rng: &mut R,
    ) {
        let global = global_best.to_position();
        for (d, spec) in PARAM_SPECS.iter().enumerate() {
            let (lo, hi) = spec.search_bounds();
            let limit = pso.max_velocity * spec.search_span();
            let x = self.position[d];
            let r1: f64 = rng.random();
            let r2: f64 = rng.random();

            let v = pso.inertia * self.velocity[d]
                + pso.cognitive * r1 * (self.best_position[d] - x)
                + pso.social * r2 * (global[d] - x);
            self.velocity[d] = v.clamp(-limit, limit);
            self.position[d] = (x + self.velocity[d]).clamp(lo, hi);
        }
        self.config = SchedulerConfig::from_position(&self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(gain: f64, share: f64, idle: f64) -> SchedulerConfig {
        SchedulerConfig {
            reconfig_min_gain: gain,
            reconfig_max_share: share,
            power_off_idle: idle,
        }
    }

    #[test]
    fn test_zero_coefficients_are_idempotent() {
        let start = config(0.3, 0.5, 2.0);
        let mut p = Particle::new(start);
        p.update_cost(1.0);
        let pso = PsoParams::default().with_inertia(0.0).with_coefficients(0.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..5 {
            p.update_position(&config(0.9, 1.0, 100.0), &pso, &mut rng);
        }
        for (a, b) in start.values().iter().zip(p.config().values()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(p.velocity().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_moves_toward_global_best() {
        let mut p = Particle::new(config(0.0, 0.05, 0.01));
        p.update_cost(5.0);
        let target = config(0.9, 1.0, 100.0);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        p.update_position(&target, &PsoParams::default(), &mut rng);
        assert!(p.config().reconfig_min_gain >= 0.0);
        assert!(p.config().reconfig_max_share >= 0.05);
        assert!(p.config().power_off_idle >= 0.01);
        let moved = p
            .position()
            .iter()
            .zip(config(0.0, 0.05, 0.01).to_position())
            .any(|(a, b)| (a - b).abs() > 1e-12);
        assert!(moved);
    }

    #[test]
    fn test_velocity_and_position_clamped() {
        let mut p = Particle::new(config(0.0, 0.05, 0.01));
        p.update_cost(5.0);
        let pso = PsoParams::default()
            .with_coefficients(50.0, 50.0)
            .with_max_velocity(0.1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            p.update_position(&config(0.9, 1.0, 100.0), &pso, &mut rng);
            for (d, spec) in PARAM_SPECS.iter().enumerate() {
                let (lo, hi) = spec.search_bounds();
                assert!(p.velocity()[d].abs() <= 0.1 * spec.search_span() + 1e-12);
                assert!(p.position()[d] >= lo - 1e-12 && p.position()[d] <= hi + 1e-12);
            }
        }
    }

    #[test]
    fn test_personal_best_tracks_lowest_cost() {
        let mut p = Particle::new(config(0.2, 0.5, 1.0));
        assert!(p.personal_best().is_none());
        p.update_cost(3.0);
        p.update_position(
            &config(0.8, 0.9, 50.0),
            &PsoParams::default(),
            &mut ChaCha8Rng::seed_from_u64(4),
        );
        p.update_cost(4.0);
        let (best, cost) = p.personal_best().unwrap();
        assert!((cost - 3.0).abs() < 1e-12);
        assert!((best.reconfig_min_gain - 0.2).abs() < 1e-9);
        assert_eq!(p.cost(), Some(4.0));
    }
}
