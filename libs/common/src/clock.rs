use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// Wall clock that never hands out a timestamp earlier than the previous one.
///
/// If the system clock steps backwards (NTP adjustment, VM migration), the
/// last issued timestamp is repeated until real time catches up again.
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Start from a previously issued timestamp, e.g. the newest record of a
    /// replayed log.
    pub fn resume_from(last: DateTime<Utc>) -> Self {
        Self {
            last: Mutex::new(Some(last)),
        }
    }

    /// Returns `max(now, last issued)` and records it.
    pub fn now(&self) -> DateTime<Utc> {
        self.issue(Utc::now())
    }

    fn issue(&self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let ts = match *last {
            Some(prev) if prev > candidate => prev,
            _ => candidate,
        };
        *last = Some(ts);
        ts
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn timestamps_never_decrease() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..1_000 {
            let ts = clock.now();
            assert!(ts >= prev, "went backwards: {prev} > {ts}");
            prev = ts;
        }
    }

    #[test]
    fn backwards_step_repeats_last_timestamp() {
        let clock = MonotonicClock::new();
        let now = Utc::now();
        assert_eq!(clock.issue(now), now);
        assert_eq!(clock.issue(now - Duration::seconds(5)), now);
        let later = now + Duration::milliseconds(1);
        assert_eq!(clock.issue(later), later);
    }

    #[test]
    fn resume_from_future_timestamp_holds_it() {
        let future = Utc::now() + Duration::hours(1);
        let clock = MonotonicClock::resume_from(future);
        assert_eq!(clock.now(), future);
    }
}
