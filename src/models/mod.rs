//! Simulation domain models.
//!
//! Provides the entities a scheduling run operates on.
//!
//! | Type | Role |
//! |------|------|
//! | `Server` | One unit of allocatable capacity |
//! | `Job` | Malleable work request with a server range |
//! | `Task` | A placed job: servers held over an interval |

mod job;
mod server;
mod task;

pub use job::{speedup, Job, JobId};
pub use server::Server;
pub use task::{BusySpan, Reconfiguration, Task};
