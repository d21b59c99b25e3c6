//! Monotonic-ish wall clock timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp with millisecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a `Timestamp` from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current time as a `Timestamp`.
    #[must_use]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(duration.as_millis() as i64)
    }

    /// Returns the timestamp value in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns the timestamp value in seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// Returns the Unix epoch (1970-01-01 00:00:00 UTC).
    #[must_use]
    pub const fn epoch() -> Self {
        Self(0)
    }

    /// Returns the duration elapsed between `self` and a later timestamp.
    #[must_use]
    pub fn elapsed_until(&self, later: Timestamp) -> Duration {
        Duration::from_millis(later.0.saturating_sub(self.0).max(0) as u64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_now_is_positive() {
        let ts = Timestamp::now();
        assert!(ts.as_millis() > 0);
    }

    #[test]
    fn timestamp_epoch() {
        let ts = Timestamp::epoch();
        assert_eq!(ts.as_millis(), 0);
        assert_eq!(ts.as_secs(), 0);
    }

    #[test]
    fn elapsed_until_is_non_negative_and_monotonic() {
        let earlier = Timestamp::from_millis(1_000);
        let later = Timestamp::from_millis(1_500);
        assert_eq!(earlier.elapsed_until(later), Duration::from_millis(500));
        assert_eq!(later.elapsed_until(earlier), Duration::from_millis(0));
    }
}
