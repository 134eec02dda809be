use crate::clock::Timestamp;

// Every transmission first asks the scheduler. The device announces queued
//  packets with request_to_send, the scheduler answers with a clearance, and
//  after each transmission the device reports back with transmitted, which may
//  clear the next packet.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Clearance {
    /// Send one packet right away.
    Now,
    /// Send one packet once this time is reached.
    At(Timestamp),
    /// Nothing to do until the next request.
    Wait,
}

pub trait Scheduler {
    fn request_to_send(&mut self, count: usize, len: usize, now: Timestamp) -> Clearance;
    fn transmitted(&mut self, count: usize, len: usize, now: Timestamp) -> Clearance;
}

/// Enforces a minimum gap between consecutive transmissions.
#[derive(Debug)]
pub struct PacketRateScheduler {
    interval_ms: u64,
    next_tx: Timestamp,
    outstanding: usize,
}

impl PacketRateScheduler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            next_tx: Timestamp::ZERO,
            outstanding: 0,
        }
    }

    fn next_slot(&mut self, now: Timestamp) -> Clearance {
        if self.next_tx <= now {
            self.next_tx = now.adding(self.interval_ms);
            Clearance::Now
        } else {
            let at = self.next_tx;
            self.next_tx = self.next_tx.adding(self.interval_ms);
            Clearance::At(at)
        }
    }
}

impl Scheduler for PacketRateScheduler {
    fn request_to_send(&mut self, count: usize, _len: usize, now: Timestamp) -> Clearance {
        self.outstanding += count;
        self.next_slot(now)
    }

    fn transmitted(&mut self, count: usize, _len: usize, now: Timestamp) -> Clearance {
        self.outstanding = self.outstanding.saturating_sub(count);
        if self.outstanding == 0 {
            return Clearance::Wait;
        }
        self.next_slot(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_rate() {
        let t = Timestamp::from_ms;
        let mut s = PacketRateScheduler::new(10);

        // The first packet goes out at once, later ones are spaced out
        assert_eq!(s.request_to_send(1, 100, t(1000)), Clearance::Now);
        assert_eq!(s.transmitted(1, 100, t(1000)), Clearance::Wait);
        assert_eq!(s.request_to_send(1, 100, t(1001)), Clearance::At(t(1010)));
        assert_eq!(s.request_to_send(1, 100, t(1002)), Clearance::At(t(1020)));

        // Each transmission with more outstanding books the next slot
        assert_eq!(s.transmitted(1, 100, t(1010)), Clearance::At(t(1030)));
        assert_eq!(s.transmitted(1, 100, t(1020)), Clearance::Wait);

        // After a quiet period we are cleared immediately again
        assert_eq!(s.request_to_send(1, 100, t(2000)), Clearance::Now);
    }
}
