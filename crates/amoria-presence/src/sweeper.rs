//! Expiry sweeper — evicts lapsed grants from the store.

use std::sync::Arc;

use crate::clock::Clock;
use crate::grant::GrantStore;

/// Garbage-collects expired grants. Never evicts an unexpired grant; the
/// store is unbounded but self-limiting, since the candidate pool and the
/// grant duration bound its size.
pub struct Sweeper {
    /// Grant store pruned by this task.
    store: Arc<GrantStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").finish()
    }
}

impl Sweeper {
    /// Create a sweeper over the given store.
    pub fn new(store: Arc<GrantStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Run one sweep cycle. Returns the number of grants evicted.
    pub fn sweep_once(&self) -> usize {
        let now = self.clock.now();
        let expired = self.store.expired(now);

        for user_id in &expired {
            self.store.delete(user_id);
        }

        if !expired.is_empty() {
            tracing::debug!(evicted = expired.len(), "Swept expired presence grants");
        }

        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};

    #[test]
    fn test_sweep_evicts_only_expired_grants() {
        let store = Arc::new(GrantStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sweeper = Sweeper::new(Arc::clone(&store), clock.clone());

        let now = clock.now();
        store.set("lapsed", now - Duration::seconds(1));
        store.set("boundary", now);
        store.set("fresh", now + Duration::minutes(7));

        assert_eq!(sweeper.sweep_once(), 2);
        assert_eq!(store.get("lapsed"), None);
        assert_eq!(store.get("boundary"), None);
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_sweep_after_advancing_past_expiry() {
        let store = Arc::new(GrantStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sweeper = Sweeper::new(Arc::clone(&store), clock.clone());

        store.set("user-1", clock.now() + Duration::minutes(7));
        assert_eq!(sweeper.sweep_once(), 0);
        assert!(store.get("user-1").is_some());

        clock.advance(Duration::minutes(8));
        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(store.get("user-1"), None);
    }
}
