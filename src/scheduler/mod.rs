//! Multi-server scheduler, policy parameters, power and KPI evaluation.
//!
//! # Algorithm
//!
//! `Scheduler` is an event-driven FIFO scheduler for malleable jobs. Jobs
//! are placed on a random subset of the free servers when they fit, and
//! queued otherwise. At each event the queue is drained in order and,
//! when enabled, running tasks are grown onto servers nobody else can use
//! (dynamic reconfiguration).
//!
//! # Power and KPI
//!
//! `energy_report` derives the energy of a finished run under a
//! `PowerPolicy`; `RunKpi` computes makespan, flow time, wait time and
//! utilization.
//!
//! # References
//!
//! - Feitelson et al. (1997), "Theory and Practice in Parallel Job Scheduling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 5

mod config;
mod engine;
mod kpi;
mod power;

pub use config::{
    ParamScale, ParamSpec, Position, SchedulerConfig, SchedulerFeatures, PARAM_COUNT, PARAM_SPECS,
};
pub use engine::{Admission, ReconfigCandidate, Scheduler, UpdateReport};
pub use kpi::RunKpi;
pub use power::{energy_report, EnergyReport, PowerModel, PowerPolicy};
