//! Presence simulation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Presence simulation configuration.
///
/// The defaults match the production tuning: a rotation every two minutes
/// granting 5–12 users seven minutes of simulated presence, swept every
/// thirty seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Interval in seconds between rotation ticks.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_seconds: u64,
    /// Delay in seconds before the first (warm-up) rotation after start.
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_seconds: u64,
    /// Interval in seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How long a simulated-presence grant lasts, in minutes.
    #[serde(default = "default_grant_duration")]
    pub grant_duration_minutes: i64,
    /// Minimum number of users granted per rotation (capped by pool size).
    #[serde(default = "default_batch_min")]
    pub batch_min: usize,
    /// Maximum number of users granted per rotation (capped by pool size).
    #[serde(default = "default_batch_max")]
    pub batch_max: usize,
    /// How recent a `last_seen` timestamp must be, in minutes, to count as
    /// genuinely online.
    #[serde(default = "default_real_recency")]
    pub real_recency_minutes: i64,
}

impl PresenceConfig {
    /// Rotation tick interval.
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_seconds)
    }

    /// Warm-up delay before the first rotation.
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_secs(self.warmup_delay_seconds)
    }

    /// Expiry sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Lifetime of a single grant.
    pub fn grant_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.grant_duration_minutes)
    }

    /// Recency window within which a heartbeat counts as genuinely online.
    pub fn real_recency(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.real_recency_minutes)
    }

    /// Check the configuration for inconsistent values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.batch_max == 0 {
            return Err(AppError::validation("presence.batch_max must be at least 1"));
        }
        if self.batch_min > self.batch_max {
            return Err(AppError::validation(format!(
                "presence.batch_min ({}) exceeds presence.batch_max ({})",
                self.batch_min, self.batch_max
            )));
        }
        if self.rotation_interval_seconds == 0 || self.sweep_interval_seconds == 0 {
            return Err(AppError::validation(
                "presence rotation and sweep intervals must be non-zero",
            ));
        }
        if self.grant_duration_minutes <= 0 {
            return Err(AppError::validation(
                "presence.grant_duration_minutes must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            rotation_interval_seconds: default_rotation_interval(),
            warmup_delay_seconds: default_warmup_delay(),
            sweep_interval_seconds: default_sweep_interval(),
            grant_duration_minutes: default_grant_duration(),
            batch_min: default_batch_min(),
            batch_max: default_batch_max(),
            real_recency_minutes: default_real_recency(),
        }
    }
}

fn default_rotation_interval() -> u64 {
    120
}

fn default_warmup_delay() -> u64 {
    1
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_grant_duration() -> i64 {
    7
}

fn default_batch_min() -> usize {
    5
}

fn default_batch_max() -> usize {
    12
}

fn default_real_recency() -> i64 {
    5
}
