use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub ms_since_1970: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { ms_since_1970: 0 };

    pub fn from_ms(ms_since_1970: u64) -> Self {
        Self { ms_since_1970 }
    }

    pub fn adding(&self, ms: u64) -> Self {
        Self {
            ms_since_1970: self.ms_since_1970.saturating_add(ms),
        }
    }

    pub fn difference(&self, other: &Self) -> Option<u64> {
        self.ms_since_1970.checked_sub(other.ms_since_1970)
    }

    // True once `timeout_ms` has fully elapsed since `self`.
    pub fn expired(&self, timeout_ms: u64, now: Timestamp) -> bool {
        self.adding(timeout_ms) <= now
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03}",
            self.ms_since_1970 / 1000,
            self.ms_since_1970 % 1000
        )
    }
}

pub trait Clock {
    fn now(&mut self) -> Timestamp;
}

// A clock that only moves when told to. Used by simulations, where one
//  process hosts many relays that must share a virtual timeline.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Timestamp,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: start }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.adding(ms);
    }

    pub fn set(&mut self, now: Timestamp) {
        self.now = now;
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> Timestamp {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired() {
        let t = Timestamp::from_ms(1000);
        assert!(!t.expired(500, Timestamp::from_ms(1499)));
        assert!(t.expired(500, Timestamp::from_ms(1500)));
        assert!(t.expired(0, t));
        assert!(Timestamp::from_ms(u64::MAX - 1).adding(10).ms_since_1970 == u64::MAX);
    }

    #[test]
    fn test_manual_clock() {
        let mut clock = ManualClock::new(Timestamp::from_ms(10));
        assert_eq!(clock.now(), Timestamp::from_ms(10));
        clock.advance(5);
        assert_eq!(clock.now(), Timestamp::from_ms(15));
        assert_eq!(
            clock.now().difference(&Timestamp::from_ms(10)),
            Some(5)
        );
        assert_eq!(Timestamp::from_ms(1).difference(&Timestamp::from_ms(2)), None);
        assert_eq!(format!("{}", Timestamp::from_ms(12034)), "12.034");
    }
}
