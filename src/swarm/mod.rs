//! Particle-swarm search over scheduler parameters.
//!
//! Each [`Particle`] holds one [`SchedulerConfig`](crate::scheduler::SchedulerConfig);
//! its cost is the mean [`RunStat::cost`](crate::experiment::RunStat) of a
//! batch of simulations. The [`Swarm`] evaluates the population, tracks the
//! best configuration and summarizes each epoch as an [`EpochCost`].
//!
//! # Reference
//! Kennedy & Eberhart (1995), "Particle Swarm Optimization"

mod epoch;
mod optimizer;
mod particle;

pub use epoch::EpochCost;
pub use optimizer::Swarm;
pub use particle::{Particle, PsoParams};
