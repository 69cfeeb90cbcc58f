//! Candidate registry — last-known real presence per visible user.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One observation of a user's authentic online status, as reported by a
/// view currently rendering that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// User identifier.
    pub user_id: String,
    /// Whether the user was genuinely online at observation time.
    pub is_real_online: bool,
}

impl Candidate {
    /// Create a candidate observation.
    pub fn new(user_id: impl Into<String>, is_real_online: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_real_online,
        }
    }
}

/// Best-effort cache of the latest observation per user id.
///
/// Entries are upserted whenever a view registers a batch of visible users
/// and are never explicitly deleted; stale entries are only consulted
/// opportunistically during rotation and get overwritten on the next
/// observation.
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    /// User ID → last-known real-presence flag.
    observed: DashMap<String, bool>,
}

impl CandidateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            observed: DashMap::new(),
        }
    }

    /// Upsert a batch of observations. Entries with an empty id are skipped.
    pub fn register(&self, candidates: impl IntoIterator<Item = Candidate>) {
        for candidate in candidates {
            if candidate.user_id.is_empty() {
                continue;
            }
            self.observed
                .insert(candidate.user_id, candidate.is_real_online);
        }
    }

    /// Last-known real-presence flag for a user, if ever observed.
    pub fn get(&self, user_id: &str) -> Option<bool> {
        self.observed.get(user_id).map(|r| *r.value())
    }

    /// All current observations, ordered by user id.
    pub fn snapshot(&self) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = self
            .observed
            .iter()
            .map(|r| Candidate::new(r.key().clone(), *r.value()))
            .collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        all
    }

    /// Number of observed users.
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// Whether no user has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }
}
