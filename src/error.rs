//! Error types.

use thiserror::Error;

use crate::models::JobId;
use crate::validation::ValidationError;

/// Errors raised by the scheduling engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job {0} is referenced by a task but was never submitted")]
    UnknownJob(JobId),

    #[error("job {0} was already submitted")]
    DuplicateJob(JobId),

    #[error("time went backwards: clock is at {clock}, request at {requested}")]
    ClockRegression { clock: f64, requested: f64 },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors raised while running a simulated experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("invalid experiment parameters: {0}")]
    InvalidParameters(String),

    #[error("generated workload is invalid ({} problems, first: {})", .0.len(), first_message(.0))]
    InvalidWorkload(Vec<ValidationError>),

    #[error("simulation did not terminate after {events} events")]
    DidNotTerminate { events: usize },

    #[error("simulation stalled at t={time} with {queued} jobs still queued")]
    Stalled { time: f64, queued: usize },

    #[error("harness returned no runs")]
    NoRuns,

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("none")
}

/// Errors raised by the particle swarm.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("a swarm needs at least 2 particles, got {0}")]
    TooFewParticles(usize),

    #[error("each particle must run at least one experiment")]
    NoExperiments,

    #[error("epoch statistics need at least 2 cost samples, got {0}")]
    InsufficientSamples(usize),

    #[error("evaluation of particle {particle} failed in epoch {epoch}")]
    Evaluation {
        epoch: usize,
        particle: usize,
        #[source]
        source: ExperimentError,
    },
}

/// Errors raised by CSV and chart sinks.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised while loading the YAML configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for the training and benchmark workflows.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Experiment(#[from] ExperimentError),

    #[error(transparent)]
    Swarm(#[from] SwarmError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
