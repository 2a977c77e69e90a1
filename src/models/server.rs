//! Server model.
//!
//! A server is one unit of allocatable capacity. It carries no state of
//! its own: whether it is busy at a given instant is derived from the
//! tasks holding it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An allocatable server, identified by a pool-local index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Server(u32);

impl Server {
    /// Creates a server with the given identifier.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Server identifier.
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }

    /// Builds a pool of `count` servers with identifiers `0..count`.
    pub fn pool(count: usize) -> Vec<Server> {
        (0..count as u32).map(Server).collect()
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_ids() {
        let pool = Server::pool(4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool[0].id(), 0);
        assert_eq!(pool[3], Server::new(3));
    }

    #[test]
    fn test_empty_pool() {
        assert!(Server::pool(0).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Server::new(7).to_string(), "S7");
    }
}
