//! Randomized simulation experiments.
//!
//! An experiment draws a synthetic job stream, drives a [`Scheduler`]
//! over it and reduces the result to a [`RunStat`]. The
//! [`ExperimentHarness`] trait is the seam the swarm evaluates particles
//! through; [`Experiments`] is the provided implementation.
//!
//! [`Scheduler`]: crate::scheduler::Scheduler

mod benchmark;
mod harness;
mod workload;

pub use benchmark::{benchmark_suite, BenchmarkVariant};
pub use harness::{simulate, ExperimentHarness, ExperimentParams, Experiments, RunStat};
pub use workload::WorkloadParams;
