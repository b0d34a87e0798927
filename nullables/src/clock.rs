//! Nullable clock — deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use voteroll_types::{Clock, Timestamp};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or by one second per reading
/// when created with [`NullClock::ticking`] (handy for ordering active-log
/// entries).
pub struct NullClock {
    current: AtomicU64,
    step: u64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
            step: 0,
        }
    }

    /// A clock that advances by one second after every reading.
    pub fn ticking(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
            step: 1,
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.fetch_add(self.step, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_only_moves_when_told() {
        let clock = NullClock::new(100);
        assert_eq!(clock.now(), Timestamp::new(100));
        assert_eq!(clock.now(), Timestamp::new(100));
        clock.advance(5);
        assert_eq!(clock.now(), Timestamp::new(105));
        clock.set(7);
        assert_eq!(clock.now(), Timestamp::new(7));
    }

    #[test]
    fn ticking_clock_advances_per_reading() {
        let clock = NullClock::ticking(10);
        assert_eq!(clock.now(), Timestamp::new(10));
        assert_eq!(clock.now(), Timestamp::new(11));
        assert_eq!(clock.now(), Timestamp::new(12));
    }
}
