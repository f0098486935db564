//! Statistics snapshots exposed by stateful target sources.
//!
//! These types are "UI safe" - Clone + Debug + Serialize + Deserialize with
//! no infrastructure dependencies, so adapters can hand them straight to
//! logs or monitoring endpoints.

use serde::{Deserialize, Serialize};

/// Snapshot of a pooling target source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Maximum number of targets that can be borrowed at once.
    pub max_size: usize,
    /// Targets currently borrowed and not yet released.
    pub active: usize,
    /// Targets parked in the pool, ready to be borrowed.
    pub idle: usize,
}

impl PoolStats {
    /// Number of additional targets that can be borrowed right now.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.max_size.saturating_sub(self.active)
    }

    /// Check if every slot is borrowed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.active >= self.max_size
    }
}

/// Snapshot of a thread-bound target source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadLocalStats {
    /// Total acquisitions served.
    pub invocations: u64,
    /// Acquisitions answered by a target already bound to the calling thread.
    pub hits: u64,
    /// Targets currently bound to a thread.
    pub objects: usize,
}

impl ThreadLocalStats {
    /// Acquisitions that had to create a new target.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.invocations.saturating_sub(self.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_stats_available() {
        let stats = PoolStats {
            max_size: 4,
            active: 3,
            idle: 1,
        };
        assert_eq!(stats.available(), 1);
        assert!(!stats.is_exhausted());

        let full = PoolStats {
            active: 4,
            ..stats
        };
        assert_eq!(full.available(), 0);
        assert!(full.is_exhausted());
    }

    #[test]
    fn test_thread_local_misses() {
        let stats = ThreadLocalStats {
            invocations: 10,
            hits: 7,
            objects: 3,
        };
        assert_eq!(stats.misses(), 3);
    }

    #[test]
    fn test_pool_stats_serialize() {
        let stats = PoolStats {
            max_size: 2,
            active: 1,
            idle: 0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"max_size":2,"active":1,"idle":0}"#);
    }
}
