//! Millisecond tick counter.
//!
//! Ticks are a wrapping `u32` count of milliseconds. Differences are taken
//! with wrapping arithmetic, so spans are valid as long as they stay below
//! [`Ticks::MAX_SPAN`] (about 24 days).

use core::fmt;
use std::time::Duration;

/// A point on a backend's millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ticks(pub u32);

impl Ticks {
    /// Longest span that compares correctly across a wrap.
    pub const MAX_SPAN: u32 = u32::MAX / 2;

    /// Raw millisecond count.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`.
    pub const fn since(self, earlier: Ticks) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// `self` moved forward by `ms`, wrapping.
    pub const fn after(self, ms: u32) -> Ticks {
        Ticks(self.0.wrapping_add(ms))
    }

    /// Convert a timeout to whole milliseconds, rounding up and clamping to
    /// [`Ticks::MAX_SPAN`].
    pub fn span_of(timeout: Duration) -> u32 {
        let micros = timeout.as_micros();
        let ms = micros.div_ceil(1000);
        ms.min(u128::from(Self::MAX_SPAN)) as u32
    }
}

/// A bounded wait measured on a backend clock.
///
/// Callers pass the backend's current time in, so one deadline type serves
/// every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Ticks,
    span: u32,
}

impl Deadline {
    /// Deadline `timeout` after `now`.
    pub fn new(now: Ticks, timeout: Duration) -> Self {
        Self {
            start: now,
            span: Ticks::span_of(timeout),
        }
    }

    /// Time left, or `None` once expired.
    pub fn remaining(&self, now: Ticks) -> Option<Duration> {
        let elapsed = now.since(self.start);
        (elapsed < self.span).then(|| Duration::from_millis(u64::from(self.span - elapsed)))
    }

    /// Milliseconds elapsed since the deadline was set.
    pub fn elapsed(&self, now: Ticks) -> u32 {
        now.since(self.start)
    }

    /// Whether more than the allowed span has passed.
    pub fn overrun(&self, now: Ticks) -> bool {
        self.elapsed(now) > self.span
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_handles_wrap() {
        let before = Ticks(u32::MAX - 4);
        let after = before.after(10);
        assert_eq!(after, Ticks(5));
        assert_eq!(after.since(before), 10);
    }

    #[test]
    fn deadline_counts_down() {
        let deadline = Deadline::new(Ticks(100), Duration::from_millis(30));
        assert_eq!(deadline.remaining(Ticks(100)), Some(Duration::from_millis(30)));
        assert_eq!(deadline.remaining(Ticks(120)), Some(Duration::from_millis(10)));
        assert_eq!(deadline.remaining(Ticks(130)), None);
        assert!(!deadline.overrun(Ticks(130)));
        assert!(deadline.overrun(Ticks(131)));

        let immediate = Deadline::new(Ticks(7), Duration::ZERO);
        assert_eq!(immediate.remaining(Ticks(7)), None);
    }

    #[test]
    fn span_rounds_up_and_clamps() {
        assert_eq!(Ticks::span_of(Duration::ZERO), 0);
        assert_eq!(Ticks::span_of(Duration::from_micros(1)), 1);
        assert_eq!(Ticks::span_of(Duration::from_millis(250)), 250);
        assert_eq!(Ticks::span_of(Duration::MAX), Ticks::MAX_SPAN);
    }
}
