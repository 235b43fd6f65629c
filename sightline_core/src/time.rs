// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time.
//!
//! [`HostTime`] is a point on the host's monotonic clock in microsecond ticks.
//! Browser hosts report `DOMHighResTimeStamp` values (fractional milliseconds
//! since `performance.timeOrigin`); [`HostTime::from_millis_f64`] converts
//! those. [`Duration`] uses the same units.

use core::fmt;
use core::ops::Add;

/// A point in time expressed as microseconds on the host's monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value (microseconds).
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts a millisecond timestamp such as a `DOMHighResTimeStamp`.
    ///
    /// Negative and NaN inputs map to zero; values beyond the `u64` range
    /// saturate.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "float-to-int `as` saturates and maps NaN to zero"
    )]
    pub fn from_millis_f64(ms: f64) -> Self {
        Self((ms * 1000.0) as u64)
    }

    /// Returns this time as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    /// Saturates at `u64::MAX` ticks.
    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({}µs)", self.0)
    }
}

/// A duration in microseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// One frame at 60 Hz, rounded to whole microseconds.
    pub const FRAME_60HZ: Self = Self(16_667);
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}µs)", self.0)
    }
}
