//! Run quality metrics (KPIs).
//!
//! Computes job-level performance indicators from a finished scheduler.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest task completion |
//! | Mean flow time | Mean of completion - submission |
//! | Mean wait time | Mean of start - submission |
//! | Utilization | Busy server-time / (servers × makespan) |
//!
//! # Reference
//! Feitelson et al. (1997), "Theory and Practice in Parallel Job Scheduling"

use super::Scheduler;
use crate::error::SchedulerResult;

/// Job-level performance indicators of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunKpi {
    /// Jobs that completed.
    pub completed: usize,
    /// Latest completion time.
    pub makespan: f64,
    /// Mean time from submission to completion.
    pub mean_flow_time: f64,
    /// Mean time from submission to start.
    pub mean_wait_time: f64,
    /// Busy share of the pool's capacity over the makespan (0.0..1.0).
    pub utilization: f64,
}

impl RunKpi {
    /// Computes KPIs from the scheduler's tasks and jobs.
    ///
    /// Jobs still queued are not counted.
    ///
    /// # Errors
    /// [`SchedulerError::UnknownJob`](crate::error::SchedulerError::UnknownJob)
    /// if a task references a job the scheduler never accepted.
    pub fn calculate(scheduler: &Scheduler) -> SchedulerResult<Self> {
        let mut completed = 0;
        let mut makespan: f64 = 0.0;
        let mut total_flow = 0.0;
        let mut total_wait = 0.0;
        let mut busy = 0.0;

        for task in scheduler.tasks() {
            let submitted = scheduler.job(task.job_id)?.submission_time;
            completed += 1;
            makespan = makespan.max(task.end_time);
            total_flow += task.end_time - submitted;
            total_wait += task.start_time - submitted;
            busy += task
                .busy_spans()
                .iter()
                .map(|s| s.end - s.start)
                .sum::<f64>();
        }

        let capacity = scheduler.servers().len() as f64 * makespan;
        let (mean_flow_time, mean_wait_time) = if completed == 0 {
            (0.0, 0.0)
        } else {
            (total_flow / completed as f64, total_wait / completed as f64)
        };

        Ok(Self {
            completed,
            makespan,
            mean_flow_time,
            mean_wait_time,
            utilization: if capacity > 0.0 { busy / capacity } else { 0.0 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;
    use crate::models::{Job, Server, Task};
    use crate::scheduler::{SchedulerConfig, SchedulerFeatures};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_kpi_basic() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = Scheduler::new(
            Server::pool(4),
            SchedulerConfig::default(),
            SchedulerFeatures::fifo(),
        );
        s.schedule(Job::new(1, 0.0, 8.0).with_servers(4, 4), &mut rng).unwrap(); // [0, 2]
        s.schedule(Job::new(2, 1.0, 4.0).with_servers(2, 2), &mut rng).unwrap(); // queued
        s.update_schedule(2.0, &mut rng).unwrap(); // [2, 4]

        let kpi = RunKpi::calculate(&s).unwrap();
        assert_eq!(kpi.completed, 2);
        assert!((kpi.makespan - 4.0).abs() < 1e-12);
        // flows: 2 and 3
        assert!((kpi.mean_flow_time - 2.5).abs() < 1e-12);
        // waits: 0 and 1
        assert!((kpi.mean_wait_time - 0.5).abs() < 1e-12);
        // busy: 8 + 4 over 16
        assert!((kpi.utilization - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_kpi_empty() {
        let s = Scheduler::new(
            Server::pool(2),
            SchedulerConfig::default(),
            SchedulerFeatures::fifo(),
        );
        let kpi = RunKpi::calculate(&s).unwrap();
        assert_eq!(kpi.completed, 0);
        assert!((kpi.makespan - 0.0).abs() < 1e-12);
        assert!((kpi.utilization - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_kpi_unknown_job_is_fatal() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = Scheduler::new(
            Server::pool(2),
            SchedulerConfig::default(),
            SchedulerFeatures::fifo(),
        );
        s.schedule(Job::new(1, 0.0, 1.0), &mut rng).unwrap();
        s.push_task_unchecked(Task::new(7, 1.0, vec![Server::new(1)], 0.0, 1.0));
        assert!(matches!(
            RunKpi::calculate(&s),
            Err(SchedulerError::UnknownJob(7))
        ));
    }
}
