//! Synthetic workload generation.
//!
//! Jobs arrive as a Poisson process (exponential inter-arrival times);
//! mass, parallel efficiency and server range are drawn uniformly.
//!
//! | Field | Distribution |
//! |-------|--------------|
//! | Inter-arrival | `Exp(1 / mean_interarrival)`, first job at t=0 |
//! | Mass | `U[mass_min, mass_max]` |
//! | Alpha | `U[alpha_min, alpha_max]` |
//! | `min_servers` | `U{1 ..= ceil(pool × max_min_share)}` |
//! | `max_servers` | `U{min_servers ..= pool}` |

use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use crate::error::ExperimentError;
use crate::models::{Job, JobId};

/// Parameters of the random workload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadParams {
    /// Jobs per run.
    pub job_count: usize,
    /// Mean time between consecutive arrivals.
    pub mean_interarrival: f64,
    /// Smallest job mass.
    pub mass_min: f64,
    /// Largest job mass.
    pub mass_max: f64,
    /// Smallest parallel-efficiency exponent.
    pub alpha_min: f64,
    /// Largest parallel-efficiency exponent.
    pub alpha_max: f64,
    /// Largest `min_servers` as a share of the pool.
    pub max_min_share: f64,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            job_count: 40,
            mean_interarrival: 1.5,
            mass_min: 1.0,
            mass_max: 30.0,
            alpha_min: 0.5,
            alpha_max: 1.0,
            max_min_share: 0.5,
        }
    }
}

impl WorkloadParams {
    /// Sets the number of jobs per run.
    pub fn with_job_count(mut self, job_count: usize) -> Self {
        self.job_count = job_count;
        self
    }

    /// Sets the mean inter-arrival time.
    pub fn with_mean_interarrival(mut self, mean: f64) -> Self {
        self.mean_interarrival = mean;
        self
    }

    /// Checks the parameters against a pool of `server_count` servers.
    pub fn validate(&self, server_count: usize) -> Result<(), ExperimentError> {
        let invalid = |msg: String| Err(ExperimentError::InvalidParameters(msg));
        if server_count == 0 {
            return invalid("server pool is empty".into());
        }
        if self.job_count == 0 {
            return invalid("job_count must be positive".into());
        }
        if !(self.mean_interarrival.is_finite() && self.mean_interarrival > 0.0) {
            return invalid(format!("mean_interarrival {}", self.mean_interarrival));
        }
        if !(self.mass_min > 0.0 && self.mass_min <= self.mass_max && self.mass_max.is_finite()) {
            return invalid(format!("mass range {}..={}", self.mass_min, self.mass_max));
        }
        if !(self.alpha_min > 0.0 && self.alpha_min <= self.alpha_max && self.alpha_max <= 1.0) {
            return invalid(format!("alpha range {}..={}", self.alpha_min, self.alpha_max));
        }
        if !(self.max_min_share > 0.0 && self.max_min_share <= 1.0) {
            return invalid(format!("max_min_share {}", self.max_min_share));
        }
        Ok(())
    }

    /// Draws a job stream for a pool of `server_count` servers.
    ///
    /// Jobs are returned in submission order with ids `0..job_count`.
    pub fn generate<R: Rng>(
        &self,
        server_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Job>, ExperimentError> {
        self.validate(server_count)?;
        let interarrival = Exp::new(1.0 / self.mean_interarrival)
            .map_err(|e| ExperimentError::InvalidParameters(e.to_string()))?;
        let largest_min =
            ((server_count as f64 * self.max_min_share).ceil() as usize).clamp(1, server_count);

        let mut jobs = Vec::with_capacity(self.job_count);
        let mut time = 0.0;
        for id in 0..self.job_count {
            if id > 0 {
                time += interarrival.sample(rng);
            }
            let min = rng.random_range(1..=largest_min);
            let max = rng.random_range(min..=server_count);
            let job = Job::new(id as JobId, time, rng.random_range(self.mass_min..=self.mass_max))
                .with_alpha(rng.random_range(self.alpha_min..=self.alpha_max))
                .with_servers(min, max);
            jobs.push(job);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_jobs;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generate_valid_stream() {
        let params = WorkloadParams::default();
        let jobs = params.generate(8, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(jobs.len(), 40);
        assert!(validate_jobs(&jobs, 8).is_ok());
        assert!((jobs[0].submission_time - 0.0).abs() < 1e-12);
        assert!(jobs
            .windows(2)
            .all(|w| w[0].submission_time <= w[1].submission_time));
        for job in &jobs {
            assert!(job.min_servers <= 4, "job {} min {}", job.id, job.min_servers);
            assert!(job.mass >= 1.0 && job.mass <= 30.0);
            assert!(job.alpha >= 0.5 && job.alpha <= 1.0);
        }
    }

    #[test]
    fn test_generate_is_seeded() {
        let params = WorkloadParams::default().with_job_count(10);
        let a = params.generate(4, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        let b = params.generate(4, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        let c = params.generate(4, &mut ChaCha8Rng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_mean_interarrival() {
        let params = WorkloadParams::default()
            .with_job_count(4001)
            .with_mean_interarrival(2.0);
        let jobs = params.generate(4, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let mean = jobs[4000].submission_time / 4000.0;
        assert!((mean - 2.0).abs() < 0.2, "{mean}");
    }

    #[test]
    fn test_single_server_pool() {
        let jobs = WorkloadParams::default()
            .generate(1, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();
        assert!(jobs.iter().all(|j| j.min_servers == 1 && j.max_servers == 1));
    }

    #[test]
    fn test_invalid_params() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(WorkloadParams::default().generate(0, &mut rng).is_err());
        assert!(WorkloadParams::default()
            .with_job_count(0)
            .generate(4, &mut rng)
            .is_err());
        let bad_alpha = WorkloadParams {
            alpha_max: 1.5,
            ..WorkloadParams::default()
        };
        assert!(matches!(
            bad_alpha.generate(4, &mut rng),
            Err(ExperimentError::InvalidParameters(_))
        ));
    }
}
