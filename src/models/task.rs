//! Task model.
//!
//! A task is the execution record of one placed job: which servers it
//! holds and over which interval. Tasks are created by the scheduler at
//! placement and are only ever mutated by reconfiguration, which adds
//! servers and moves `end_time` earlier.
//!
//! # Holding intervals
//!
//! A server acquired at instant `a` is held over the open interval
//! `(a, end_time)`. Servers from the initial placement have
//! `a = start_time`; servers added by a reconfiguration at `t` have
//! `a = t`. Both boundaries count as free, so a server released at
//! `end_time` can be reused at that same instant.

use serde::{Deserialize, Serialize};

use super::{speedup, JobId, Server};

/// One server-count increase applied to a running task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconfiguration {
    /// Instant at which the servers were added.
    pub time: f64,
    /// Servers added at `time`.
    pub added: Vec<Server>,
    /// Task end time before this reconfiguration.
    pub previous_end: f64,
}

/// A placed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Job this task executes.
    pub job_id: JobId,
    /// Total work of the job.
    pub mass: f64,
    /// Servers currently held (initial placement first).
    pub servers: Vec<Server>,
    /// Placement instant.
    pub start_time: f64,
    /// Completion instant.
    pub end_time: f64,
    /// Server-count increases, in time order.
    pub reconfigurations: Vec<Reconfiguration>,
}

/// A contiguous interval during which one server works for one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusySpan {
    /// The busy server.
    pub server: Server,
    /// Job the server works for.
    pub job_id: JobId,
    /// Span start.
    pub start: f64,
    /// Span end.
    pub end: f64,
}

impl Task {
    /// Creates a task on `servers` over `[start_time, end_time]`.
    pub fn new(
        job_id: JobId,
        mass: f64,
        servers: Vec<Server>,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        debug_assert!(start_time <= end_time);
        Self {
            job_id,
            mass,
            servers,
            start_time,
            end_time,
            reconfigurations: Vec::new(),
        }
    }

    /// Number of servers currently held.
    #[inline]
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Total duration (end - start).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether the open interval `(start_time, end_time)` contains `time`.
    #[inline]
    pub fn is_running_at(&self, time: f64) -> bool {
        self.start_time < time && time < self.end_time
    }

    /// Whether the task has started and not yet finished at `time`.
    ///
    /// Unlike [`is_running_at`](Self::is_running_at) this includes the
    /// start instant, so a task placed at `time` can be reconfigured at
    /// `time`.
    #[inline]
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Instant at which `server` was acquired, or `None` if not held.
    pub fn acquired_at(&self, server: Server) -> Option<f64> {
        if let Some(r) = self
            .reconfigurations
            .iter()
            .find(|r| r.added.contains(&server))
        {
            return Some(r.time);
        }
        self.servers.contains(&server).then_some(self.start_time)
    }

    /// Whether `server` is held by this task at instant `time`.
    pub fn holds_at(&self, server: Server, time: f64) -> bool {
        self.acquired_at(server)
            .is_some_and(|from| from < time && time < self.end_time)
    }

    /// Servers held at instant `time`.
    pub fn servers_at(&self, time: f64) -> Vec<Server> {
        self.servers
            .iter()
            .copied()
            .filter(|&s| self.holds_at(s, time))
            .collect()
    }

    /// Work still to be done at `time`, given the current server count.
    pub fn remaining_work(&self, time: f64, alpha: f64) -> f64 {
        if time >= self.end_time {
            return 0.0;
        }
        let from = time.max(self.start_time);
        (self.end_time - from) * speedup(alpha, self.server_count())
    }

    /// Adds `added` servers at `time` and recomputes `end_time` from the
    /// remaining work.
    pub fn reconfigure(&mut self, time: f64, added: Vec<Server>, alpha: f64) {
        debug_assert!(self.is_active_at(time));
        let remaining = self.remaining_work(time, alpha);
        let previous_end = self.end_time;
        self.servers.extend(added.iter().copied());
        self.end_time = time + remaining / speedup(alpha, self.server_count());
        self.reconfigurations.push(Reconfiguration {
            time,
            added,
            previous_end,
        });
    }

    /// Per-server busy intervals, initial placement and reconfigurations alike.
    pub fn busy_spans(&self) -> Vec<BusySpan> {
        self.servers
            .iter()
            .filter_map(|&server| {
                self.acquired_at(server).map(|start| BusySpan {
                    server,
                    job_id: self.job_id,
                    start,
                    end: self.end_time,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers(ids: &[u32]) -> Vec<Server> {
        ids.iter().copied().map(Server::new).collect()
    }

    #[test]
    fn test_boundaries_are_free() {
        let task = Task::new(1, 8.0, servers(&[0, 1]), 1.0, 3.0);
        assert!(!task.holds_at(Server::new(0), 1.0));
        assert!(task.holds_at(Server::new(0), 2.0));
        assert!(!task.holds_at(Server::new(0), 3.0));
        assert!(!task.holds_at(Server::new(5), 2.0));
    }

    #[test]
    fn test_running_vs_active() {
        let task = Task::new(1, 8.0, servers(&[0]), 1.0, 3.0);
        assert!(!task.is_running_at(1.0));
        assert!(task.is_active_at(1.0));
        assert!(!task.is_active_at(3.0));
    }

    #[test]
    fn test_reconfigure_linear() {
        // mass 8 on 2 servers: [0, 4]. At t=2, 4 work units remain.
        let mut task = Task::new(1, 8.0, servers(&[0, 1]), 0.0, 4.0);
        task.reconfigure(2.0, servers(&[2, 3]), 1.0);
        assert_eq!(task.server_count(), 4);
        assert!((task.end_time - 3.0).abs() < 1e-12);
        assert_eq!(task.reconfigurations.len(), 1);
        assert!((task.reconfigurations[0].previous_end - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_added_servers_held_after_reconfiguration_only() {
        let mut task = Task::new(1, 8.0, servers(&[0, 1]), 0.0, 4.0);
        task.reconfigure(2.0, servers(&[2]), 1.0);
        assert!(!task.holds_at(Server::new(2), 1.0));
        assert!(task.holds_at(Server::new(2), 2.5));
        assert_eq!(task.servers_at(1.0), servers(&[0, 1]));
        assert_eq!(task.servers_at(2.5).len(), 3);
    }

    #[test]
    fn test_busy_spans() {
        let mut task = Task::new(9, 8.0, servers(&[0]), 0.0, 8.0);
        task.reconfigure(4.0, servers(&[1]), 1.0);
        let spans = task.busy_spans();
        assert_eq!(spans.len(), 2);
        assert!((spans[0].start - 0.0).abs() < 1e-12);
        assert!((spans[1].start - 4.0).abs() < 1e-12);
        assert!((spans[1].end - 6.0).abs() < 1e-12);
        assert!(spans.iter().all(|s| s.job_id == 9));
    }

    #[test]
    fn test_remaining_work_after_end() {
        let task = Task::new(1, 8.0, servers(&[0]), 0.0, 8.0);
        assert!((task.remaining_work(10.0, 1.0) - 0.0).abs() < 1e-12);
        assert!((task.remaining_work(2.0, 1.0) - 6.0).abs() < 1e-12);
    }
}
