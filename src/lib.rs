//! Multi-server job scheduling simulator with particle-swarm policy tuning.
//!
//! Simulates malleable jobs on a pool of servers under a FIFO scheduler
//! with optional dynamic reconfiguration and server power-off, and
//! searches the scheduler's numeric parameters with a particle swarm that
//! minimizes the mean cost of repeated randomized simulations.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Server`, `Job`, `Task`
//! - **`validation`**: Job stream integrity checks
//! - **`scheduler`**: `Scheduler` engine, `SchedulerConfig`, power and KPI evaluation
//! - **`experiment`**: Workload generation, simulation driver, benchmark suite
//! - **`swarm`**: `Particle`, `Swarm`, `EpochCost`
//! - **`report`**: CSV and SVG sinks
//! - **`settings`**: YAML configuration
//! - **`runner`**: Training and benchmark workflows
//!
//! # References
//!
//! - Feitelson et al. (1997), "Theory and Practice in Parallel Job Scheduling"
//! - Kennedy & Eberhart (1995), "Particle Swarm Optimization"

pub mod error;
pub mod experiment;
pub mod models;
pub mod report;
pub mod rng;
pub mod runner;
pub mod scheduler;
pub mod settings;
pub mod swarm;
pub mod validation;
