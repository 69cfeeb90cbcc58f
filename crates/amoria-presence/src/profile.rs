//! Caller-supplied backend presence signals.
//!
//! The hosted backend stores the online flag loosely: some rows carry a
//! boolean, others the string `"true"`. Only those two values count as an
//! explicit online flag.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// An online flag as stored by the backend: boolean or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OnlineFlag {
    /// Proper boolean column value.
    Flag(bool),
    /// Legacy string column value; only `"true"` counts.
    Text(String),
}

impl OnlineFlag {
    /// Whether the flag explicitly marks the user online.
    pub fn is_set(&self) -> bool {
        match self {
            Self::Flag(value) => *value,
            Self::Text(value) => value == "true",
        }
    }
}

/// The presence-relevant fields of a user profile, pre-fetched by the
/// view that owns the data-access layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePresence {
    /// User identifier.
    pub user_id: String,
    /// Explicit online flag, if the row carries one.
    #[serde(default)]
    pub status_online: Option<OnlineFlag>,
    /// Last heartbeat timestamp, if the row carries one.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl ProfilePresence {
    /// Whether the profile carries an authentic online signal: an explicit
    /// flag, or a heartbeat within the recency window.
    pub fn is_really_online(&self, now: DateTime<Utc>, recency: Duration) -> bool {
        if self.status_online.as_ref().is_some_and(OnlineFlag::is_set) {
            return true;
        }
        self.last_seen.is_some_and(|seen| now - seen < recency)
    }

    /// The candidate observation this profile contributes to the registry.
    pub fn observe(&self, now: DateTime<Utc>, recency: Duration) -> Candidate {
        Candidate::new(self.user_id.clone(), self.is_really_online(now, recency))
    }
}
