//! Time sources for a pipeline run.
//!
//! Event timestamps are read from an injected [`Clock`]. Everything that must
//! be reproducible for a given run (fallback document stamps, destination
//! directory naming) reads the single [`RunClock`] captured when the run
//! starts instead.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as integer milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Build from milliseconds since the Unix epoch. Out-of-range values
    /// clamp to the epoch.
    pub fn from_millis(ms: i64) -> Self {
        Self(Utc.timestamp_millis_opt(ms).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The instant a run started, captured once and threaded through the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    started_at: DateTime<Utc>,
}

impl RunClock {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    /// Capture the current time of `clock` as the run start.
    pub fn capture(clock: &dyn Clock) -> Self {
        Self::new(clock.now())
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at.timestamp_millis()
    }

    /// RFC 3339 stamp (millisecond precision) embedded in generated documents.
    pub fn stamp(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
