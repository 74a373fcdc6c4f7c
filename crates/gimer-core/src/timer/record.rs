//! Timer records as they are persisted.
//!
//! An active timer carries an absolute expiry so every process on the host
//! computes the same remaining time. A saved timer is a template holding only
//! a relative duration.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const DEFAULT_DESCRIPTION: &str = "Timer";

/// Opaque timer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TimerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TimerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record that can live in a [`TimerStore`](crate::storage::TimerStore).
pub trait TimerRecord: Clone + Serialize + DeserializeOwned + Send {
    fn id(&self) -> &TimerId;
}

/// A timer currently counting down or alarming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub id: TimerId,
    pub description: String,
    /// Absolute expiry. Set once at creation and never mutated.
    #[serde(rename = "trigger_time", alias = "active_timer_end")]
    pub expiry: DateTime<Utc>,
    /// Requested duration in seconds, kept for display only.
    #[serde(rename = "duration", default)]
    pub duration_secs: u64,
}

impl ActiveTimer {
    /// Arm a new timer expiring `duration_secs` after `now`.
    pub fn arm(
        description: impl Into<String>,
        duration_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let expiry = expiry_after(now, duration_secs)?;
        Ok(Self {
            id: TimerId::generate(),
            description: description.into(),
            expiry,
            duration_secs,
        })
    }

    /// Remaining time at `now`, clamped to zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let remaining = self.expiry - now;
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

impl TimerRecord for ActiveTimer {
    fn id(&self) -> &TimerId {
        &self.id
    }
}

/// A reusable template: description plus a relative duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTimer {
    pub id: TimerId,
    pub description: String,
    #[serde(rename = "duration")]
    pub duration_secs: u64,
}

impl SavedTimer {
    pub fn new(description: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            id: TimerId::generate(),
            description: description.into(),
            duration_secs,
        }
    }

    /// Instantiate an active timer from this template.
    ///
    /// The active timer gets a fresh ID so a template can run more than once
    /// concurrently.
    pub fn instantiate(&self, now: DateTime<Utc>) -> Result<ActiveTimer, ValidationError> {
        ActiveTimer::arm(self.description.clone(), self.duration_secs, now)
    }
}

impl From<&ActiveTimer> for SavedTimer {
    fn from(timer: &ActiveTimer) -> Self {
        Self::new(timer.description.clone(), timer.duration_secs)
    }
}

impl TimerRecord for SavedTimer {
    fn id(&self) -> &TimerId {
        &self.id
    }
}

/// Combine the `--seconds/--minutes/--hours` inputs into one span.
pub fn total_seconds(seconds: u64, minutes: u64, hours: u64) -> Result<u64, ValidationError> {
    let total = minutes
        .checked_mul(60)
        .and_then(|m| hours.checked_mul(3600).and_then(|h| m.checked_add(h)))
        .and_then(|mh| mh.checked_add(seconds))
        .ok_or(ValidationError::DurationOverflow)?;
    if total == 0 {
        return Err(ValidationError::EmptyDuration);
    }
    Ok(total)
}

fn expiry_after(now: DateTime<Utc>, duration_secs: u64) -> Result<DateTime<Utc>, ValidationError> {
    if duration_secs == 0 {
        return Err(ValidationError::EmptyDuration);
    }
    let secs = i64::try_from(duration_secs).map_err(|_| ValidationError::DurationOverflow)?;
    let span = Duration::try_seconds(secs).ok_or(ValidationError::DurationOverflow)?;
    now.checked_add_signed(span)
        .ok_or(ValidationError::DurationOverflow)
}

/// Format a span as `HH:MM:SS`, rounding partial seconds up.
pub fn format_hms(remaining: Duration) -> String {
    let millis = remaining.num_milliseconds().max(0);
    let total = (millis + 999) / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}
