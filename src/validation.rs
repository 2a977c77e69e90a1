//! Input validation for job streams.
//!
//! Checks structural integrity of a workload before it is simulated.
//! Detects:
//! - Duplicate job IDs
//! - Invalid server ranges (`min_servers == 0` or `min_servers > max_servers`)
//! - Server minimums the pool can never satisfy
//! - Out-of-range `alpha`, non-positive mass, invalid submission times
//!
//! A job whose `min_servers` exceeds the pool is legal for the scheduler
//! (it simply stays queued forever) but makes a simulation run stall, so
//! it is reported here.

use crate::models::Job;
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two jobs share the same ID.
    DuplicateId,
    /// `min_servers` is zero or greater than `max_servers`.
    InvalidServerRange,
    /// `min_servers` exceeds the server pool.
    ExceedsPool,
    /// `alpha` outside `(0, 1]`.
    InvalidAlpha,
    /// Mass is not a positive finite number.
    InvalidMass,
    /// Submission time is negative or not finite.
    InvalidSubmissionTime,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a job stream against a pool of `server_count` servers.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_jobs(jobs: &[Job], server_count: usize) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for job in jobs {
        if !ids.insert(job.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }

        if job.min_servers == 0 || job.min_servers > job.max_servers {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidServerRange,
                format!(
                    "Job {} has server range {}..={}",
                    job.id, job.min_servers, job.max_servers
                ),
            ));
        } else if job.min_servers > server_count {
            errors.push(ValidationError::new(
                ValidationErrorKind::ExceedsPool,
                format!(
                    "Job {} needs {} servers, pool has {}",
                    job.id, job.min_servers, server_count
                ),
            ));
        }

        if !(job.alpha > 0.0 && job.alpha <= 1.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAlpha,
                format!("Job {} has alpha {}", job.id, job.alpha),
            ));
        }

        if !(job.mass.is_finite() && job.mass > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMass,
                format!("Job {} has mass {}", job.id, job.mass),
            ));
        }

        if !(job.submission_time.is_finite() && job.submission_time >= 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSubmissionTime,
                format!("Job {} submitted at {}", job.id, job.submission_time),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
