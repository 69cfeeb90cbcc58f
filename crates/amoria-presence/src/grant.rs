//! Simulated-presence grant store.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Mapping of user id to grant expiry.
///
/// A grant is active strictly before its expiry: an entry whose
/// `expires_at` equals the current instant is already expired. Only the
/// rotation scheduler and the expiry sweeper mutate this store.
#[derive(Debug, Default)]
pub struct GrantStore {
    /// User ID → expiry of the current grant.
    grants: DashMap<String, DateTime<Utc>>,
}

impl GrantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            grants: DashMap::new(),
        }
    }

    /// Expiry of the grant for a user, if present.
    pub fn get(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.grants.get(user_id).map(|r| *r.value())
    }

    /// Create or replace a grant.
    pub fn set(&self, user_id: impl Into<String>, expires_at: DateTime<Utc>) {
        self.grants.insert(user_id.into(), expires_at);
    }

    /// Remove a grant.
    pub fn delete(&self, user_id: &str) {
        self.grants.remove(user_id);
    }

    /// Whether the user holds a grant that has not yet expired.
    pub fn is_active(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.get(user_id).is_some_and(|expires_at| expires_at > now)
    }

    /// Ids of all grants expired as of `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<String> {
        self.grants
            .iter()
            .filter(|r| *r.value() <= now)
            .map(|r| r.key().clone())
            .collect()
    }

    /// Number of grants still active as of `now`.
    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.grants.iter().filter(|r| *r.value() > now).count()
    }

    /// Total number of grants held, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Whether the store holds no grants at all.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
