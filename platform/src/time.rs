// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

#[allow(unused_imports)] // used in docs
use crate::Platform;

/// A point in time on the platform's clock, analogous to the standard
/// library `Instant` type.
///
/// Platforms hand these to the engine with every tick, and the engine derives
/// the elapsed game time from the difference between consecutive ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(Duration);

impl Debug for Instant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.duration_since(Instant::reference()) {
            Some(after) => f
                .debug_tuple("Instant")
                .field(&after)
                .field(&"after reference point")
                .finish(),
            None => f
                .debug_tuple("Instant")
                .field(&Instant::reference().saturating_duration_since(*self))
                .field(&"before reference point")
                .finish(),
        }
    }
}

impl Instant {
    /// An arbitrary point in time to use as a starting point for other
    /// instances of [`Instant`].
    ///
    /// Generally intended to be used once in the platform implementation, as
    /// the timestamp of platform startup. Use [`Platform::now`] to get the
    /// current point in time.
    pub const fn reference() -> Instant {
        Instant(Duration::from_secs(u64::MAX / 2))
    }

    /// Returns the duration from `past_instant` to `self`, or None if
    /// `past_instant` is after `self`.
    pub fn duration_since(self, past_instant: Instant) -> Option<Duration> {
        self.0.checked_sub(past_instant.0)
    }

    /// Like [`Instant::duration_since`], but clamps to zero instead of
    /// failing, for clocks that are not quite monotonic.
    pub fn saturating_duration_since(self, past_instant: Instant) -> Duration {
        self.0.saturating_sub(past_instant.0)
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;
    fn sub(self, rhs: Duration) -> Self::Output {
        Instant(self.0 - rhs)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;
    fn add(self, rhs: Duration) -> Self::Output {
        Instant(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::Instant;

    #[test]
    fn durations_between_instants() {
        let start = Instant::reference();
        let later = start + Duration::from_millis(16);
        assert_eq!(Some(Duration::from_millis(16)), later.duration_since(start));
        assert_eq!(None, start.duration_since(later));
        assert_eq!(Duration::ZERO, start.saturating_duration_since(later));
        assert_eq!(start, later - Duration::from_millis(16));
    }
}
