use std::fmt;

/// The two orchestrator entry states, derived from the local instance's own
/// replication metadata.
///
/// The state is recomputed on every invocation and never cached: the backing
/// data directory may have been wiped externally between runs, and the
/// metadata query is the only source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaState {
    /// No replication link has ever been configured; a full seed-and-configure
    /// cycle is required.
    Fresh,
    /// A replication link exists; seeding must be skipped and only read-only
    /// enforcement and health reporting remain.
    Configured,
}

impl ReplicaState {
    /// Derives the state from the number of configured replication links
    /// reported by the local instance.
    pub fn from_link_count(count: u64) -> Self {
        if count == 0 {
            ReplicaState::Fresh
        } else {
            ReplicaState::Configured
        }
    }
}

impl fmt::Display for ReplicaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaState::Fresh => write!(f, "fresh"),
            ReplicaState::Configured => write!(f, "configured"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_links_is_fresh() {
        assert_eq!(ReplicaState::from_link_count(0), ReplicaState::Fresh);
    }

    #[test]
    fn test_any_link_is_configured() {
        assert_eq!(ReplicaState::from_link_count(1), ReplicaState::Configured);
        assert_eq!(ReplicaState::from_link_count(3), ReplicaState::Configured);
    }
}
