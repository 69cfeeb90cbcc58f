//! Rotation tick — samples eligible users and grants simulated presence.

use std::sync::{Arc, Mutex};

use chrono::Duration;

use amoria_core::config::presence::PresenceConfig;

use crate::candidate::CandidateRegistry;
use crate::clock::Clock;
use crate::grant::GrantStore;
use crate::random::{shuffle, RandomSource};

/// Executes one rotation per tick: builds the eligibility pool, draws a
/// batch size, shuffles, and grants every selected user the same expiry.
pub struct Rotation {
    /// Registry of observed users.
    registry: Arc<CandidateRegistry>,
    /// Grant store written by this task.
    store: Arc<GrantStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Random source shared with the owning service.
    random: Arc<Mutex<Box<dyn RandomSource>>>,
    /// Minimum batch size before pool capping.
    batch_min: usize,
    /// Maximum batch size before pool capping.
    batch_max: usize,
    /// Lifetime of each grant.
    grant_duration: Duration,
}

impl std::fmt::Debug for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotation").finish()
    }
}

impl Rotation {
    /// Create a rotation over the given registry and store.
    pub fn new(
        registry: Arc<CandidateRegistry>,
        store: Arc<GrantStore>,
        clock: Arc<dyn Clock>,
        random: Arc<Mutex<Box<dyn RandomSource>>>,
        config: &PresenceConfig,
    ) -> Self {
        Self {
            registry,
            store,
            clock,
            random,
            batch_min: config.batch_min,
            batch_max: config.batch_max,
            grant_duration: config.grant_duration(),
        }
    }

    /// Run one rotation tick. Returns the number of users granted.
    ///
    /// Eligible users are those last observed offline whose grant is absent
    /// or already expired. Users not selected this tick are left untouched:
    /// existing unexpired grants persist, including for users who have since
    /// turned genuinely online (grants run out on their own).
    pub fn rotate_once(&self) -> usize {
        let now = self.clock.now();

        let mut pool: Vec<String> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|c| !c.is_real_online && !self.store.is_active(&c.user_id, now))
            .map(|c| c.user_id)
            .collect();

        if pool.is_empty() {
            tracing::trace!("Rotation tick: no eligible users");
            return 0;
        }

        let min = self.batch_min.min(pool.len());
        let max = self.batch_max.min(pool.len());

        let mut random = self.random.lock().unwrap_or_else(|e| e.into_inner());
        let span = (max - min + 1) as f64;
        let target = (min + (random.next_f64() * span).floor() as usize).min(max);
        shuffle(&mut pool, random.as_mut());
        drop(random);

        let expires_at = now + self.grant_duration;
        for user_id in pool.into_iter().take(target) {
            self.store.set(user_id, expires_at);
        }

        tracing::debug!(granted = target, expires_at = %expires_at, "Rotation tick complete");
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::clock::ManualClock;
    use crate::random::{SeededRandom, SequenceRandom};
    use chrono::Utc;

    struct Fixture {
        registry: Arc<CandidateRegistry>,
        store: Arc<GrantStore>,
        clock: Arc<ManualClock>,
        rotation: Rotation,
    }

    fn fixture(random: Box<dyn RandomSource>) -> Fixture {
        let registry = Arc::new(CandidateRegistry::new());
        let store = Arc::new(GrantStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let rotation = Rotation::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            clock.clone(),
            Arc::new(Mutex::new(random)),
            &PresenceConfig::default(),
        );
        Fixture {
            registry,
            store,
            clock,
            rotation,
        }
    }

    fn offline(id: impl Into<String>) -> Candidate {
        Candidate::new(id, false)
    }

    #[test]
    fn test_pool_of_twenty_grants_within_bounds() {
        let f = fixture(Box::new(SeededRandom::new(42)));
        f.registry
            .register((0..20).map(|i| offline(format!("user-{i:02}"))));

        let granted = f.rotation.rotate_once();

        assert!((5..=12).contains(&granted));
        // Selection is without replacement, so the store holds exactly
        // `granted` distinct ids.
        assert_eq!(f.store.len(), granted);

        // Every grant from one tick shares the identical expiry, seven
        // minutes from tick time.
        let expected = f.clock.now() + Duration::minutes(7);
        for i in 0..20 {
            if let Some(expires_at) = f.store.get(&format!("user-{i:02}")) {
                assert_eq!(expires_at, expected);
            }
        }
    }

    #[test]
    fn test_small_pool_grants_everyone() {
        let f = fixture(Box::new(SeededRandom::new(1)));
        f.registry
            .register(vec![offline("a"), offline("b"), offline("c")]);

        assert_eq!(f.rotation.rotate_once(), 3);
        assert_eq!(f.store.len(), 3);
    }

    #[test]
    fn test_all_real_online_is_noop() {
        let f = fixture(Box::new(SeededRandom::new(1)));
        f.registry
            .register((0..20).map(|i| Candidate::new(format!("user-{i:02}"), true)));

        assert_eq!(f.rotation.rotate_once(), 0);
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_empty_registry_is_noop() {
        let f = fixture(Box::new(SeededRandom::new(1)));
        assert_eq!(f.rotation.rotate_once(), 0);
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_real_online_users_never_granted() {
        let f = fixture(Box::new(SeededRandom::new(9)));
        f.registry
            .register((0..10).map(|i| offline(format!("off-{i}"))));
        f.registry
            .register((0..5).map(|i| Candidate::new(format!("on-{i}"), true)));

        f.rotation.rotate_once();

        for i in 0..5 {
            assert_eq!(f.store.get(&format!("on-{i}")), None);
        }
    }

    #[test]
    fn test_active_grant_holders_are_ineligible() {
        let f = fixture(Box::new(SeededRandom::new(1)));
        let held_until = f.clock.now() + Duration::minutes(3);
        f.registry.register(vec![offline("held")]);
        f.store.set("held", held_until);

        assert_eq!(f.rotation.rotate_once(), 0);
        // The existing grant is untouched, not renewed.
        assert_eq!(f.store.get("held"), Some(held_until));
    }

    #[test]
    fn test_expired_grant_holders_are_reeligible() {
        let f = fixture(Box::new(SeededRandom::new(1)));
        f.registry.register(vec![offline("lapsed")]);
        // Expiry equal to now is already expired under the strict convention.
        f.store.set("lapsed", f.clock.now());

        assert_eq!(f.rotation.rotate_once(), 1);
        assert_eq!(
            f.store.get("lapsed"),
            Some(f.clock.now() + Duration::minutes(7))
        );
    }

    #[test]
    fn test_unselected_grants_persist_untouched() {
        let f = fixture(Box::new(SeededRandom::new(3)));
        let held_until = f.clock.now() + Duration::minutes(2);
        f.store.set("held", held_until);
        f.registry.register(vec![offline("held")]);
        f.registry
            .register((0..8).map(|i| offline(format!("user-{i}"))));

        f.rotation.rotate_once();

        assert_eq!(f.store.get("held"), Some(held_until));
    }

    #[test]
    fn test_zero_draw_selects_exact_minimum() {
        // r = 0.0 on every draw: target = min, and each shuffle step swaps
        // with the front. For the sorted pool [a..f] that rotates "a" to the
        // back, so the five survivors are b..f.
        let f = fixture(Box::new(SequenceRandom::new(vec![0.0])));
        for id in ["a", "b", "c", "d", "e", "f"] {
            f.registry.register(vec![offline(id)]);
        }

        assert_eq!(f.rotation.rotate_once(), 5);
        assert_eq!(f.store.get("a"), None);
        for id in ["b", "c", "d", "e", "f"] {
            assert!(f.store.get(id).is_some(), "expected a grant for {id}");
        }
    }

    #[test]
    fn test_high_draw_selects_maximum() {
        // r = 0.99: target = 5 + floor(0.99 * 8) = 12, and every shuffle
        // step leaves the pool in place (j == i), so the first twelve sorted
        // ids are selected.
        let f = fixture(Box::new(SequenceRandom::new(vec![0.99])));
        f.registry
            .register((0..20).map(|i| offline(format!("user-{i:02}"))));

        assert_eq!(f.rotation.rotate_once(), 12);
        for i in 0..12 {
            assert!(f.store.get(&format!("user-{i:02}")).is_some());
        }
        for i in 12..20 {
            assert_eq!(f.store.get(&format!("user-{i:02}")), None);
        }
    }
}
