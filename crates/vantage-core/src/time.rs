//! Playback time as integer nanoseconds.
//!
//! Frame updates are driven by a monotonically non-decreasing playback
//! timestamp, not wall-clock time. Seeking backward is handled upstream by
//! re-ingestion; this type stays a plain ordered value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A playback timestamp in integer nanoseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Time(u64);

impl Time {
    /// The zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Creates a time from integer nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the time as integer nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Creates a time from fractional seconds. Negative inputs clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_sec(sec: f64) -> Self {
        Self((sec.max(0.0) * 1e9) as u64)
    }

    /// Returns the time as fractional seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_sec(self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Saturating addition of a nanosecond duration.
    #[must_use]
    pub const fn saturating_add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }

    /// Computes the interpolation fraction of `t` between `start` and `end`,
    /// clamped to `[0, 1]`. Returns 0 when `start >= end`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn interpolation_fraction(start: Self, end: Self, t: Self) -> f64 {
        if start >= end {
            return 0.0;
        }
        let span = (end.0 - start.0) as f64;
        let offset = t.0.saturating_sub(start.0) as f64;
        (offset / span).clamp(0.0, 1.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.to_sec())
    }
}
