//! Job model and the work/parallelism law.
//!
//! A job is a malleable unit of work: it can run on any server count
//! between `min_servers` and `max_servers`, and its speedup on `n`
//! servers is `n^alpha`.
//!
//! # Work law
//!
//! A job of mass `m` placed on `n` servers runs for `m / n^alpha`.
//! With `alpha = 1` the speedup is linear; with `alpha < 1` every extra
//! server contributes less than the previous one (Amdahl-style
//! sub-linear scaling). The same law is used at placement and when a
//! running task is reconfigured.
//!
//! # Reference
//! Downey (1997), "A model for speedup of parallel programs"

use serde::{Deserialize, Serialize};

/// Job identifier.
pub type JobId = u64;

/// A job submitted to the scheduler.
///
/// Immutable once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Instant at which the job is submitted.
    pub submission_time: f64,
    /// Total work.
    pub mass: f64,
    /// Parallel-efficiency exponent, `0 < alpha <= 1`.
    pub alpha: f64,
    /// Fewest servers the job can start on.
    pub min_servers: usize,
    /// Most servers the job can use.
    pub max_servers: usize,
}

impl Job {
    /// Creates a sequential job (`alpha = 1`, one server).
    pub fn new(id: JobId, submission_time: f64, mass: f64) -> Self {
        Self {
            id,
            submission_time,
            mass,
            alpha: 1.0,
            min_servers: 1,
            max_servers: 1,
        }
    }

    /// Sets the parallel-efficiency exponent.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the admissible server range.
    pub fn with_servers(mut self, min_servers: usize, max_servers: usize) -> Self {
        self.min_servers = min_servers;
        self.max_servers = max_servers;
        self
    }

    /// Execution time of the whole job on `servers` servers.
    pub fn execution_time(&self, servers: usize) -> f64 {
        self.mass / speedup(self.alpha, servers)
    }
}

/// Processing rate of a task on `servers` servers, in work units per time unit.
#[inline]
pub fn speedup(alpha: f64, servers: usize) -> f64 {
    (servers as f64).powf(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder() {
        let job = Job::new(3, 0.5, 8.0).with_alpha(0.8).with_servers(2, 6);
        assert_eq!(job.id, 3);
        assert!((job.submission_time - 0.5).abs() < 1e-12);
        assert!((job.alpha - 0.8).abs() < 1e-12);
        assert_eq!(job.min_servers, 2);
        assert_eq!(job.max_servers, 6);
    }

    #[test]
    fn test_linear_speedup() {
        let job = Job::new(1, 0.0, 8.0).with_servers(1, 4);
        assert!((job.execution_time(4) - 2.0).abs() < 1e-12);
        assert!((job.execution_time(1) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_sublinear_speedup() {
        let job = Job::new(1, 0.0, 8.0).with_alpha(0.5).with_servers(1, 4);
        // 4^0.5 = 2
        assert!((job.execution_time(4) - 4.0).abs() < 1e-12);
        assert!(speedup(0.5, 9) < 9.0);
    }
}
