use alloc::collections::BTreeMap;

use crate::clock::Timestamp;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    at: Timestamp,
    seq: u64,
}

impl TimerHandle {
    pub fn deadline(&self) -> Timestamp {
        self.at
    }
}

/// Pending one-shot timers, fired in deadline order (ties in the order they were set).
#[derive(Debug)]
pub struct TimerQueue<E> {
    timers: BTreeMap<TimerHandle, E>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(&mut self, at: Timestamp, event: E) -> TimerHandle {
        let handle = TimerHandle {
            at,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.timers.insert(handle, event);
        handle
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.keys().next().map(|h| h.at)
    }

    pub fn pop_due(&mut self, now: Timestamp) -> Option<E> {
        let handle = *self.timers.keys().next()?;
        if handle.at > now {
            return None;
        }
        self.timers.remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_cancel() {
        let mut q = TimerQueue::new();
        let t = Timestamp::from_ms;
        q.set_timer(t(30), "c");
        let b = q.set_timer(t(20), "b");
        q.set_timer(t(10), "a1");
        q.set_timer(t(10), "a2");
        assert_eq!(q.next_deadline(), Some(t(10)));

        assert!(q.cancel_timer(b));
        assert!(!q.cancel_timer(b));

        assert_eq!(q.pop_due(t(5)), None);
        assert_eq!(q.pop_due(t(25)), Some("a1"));
        assert_eq!(q.pop_due(t(25)), Some("a2"));
        assert_eq!(q.pop_due(t(25)), None);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(t(30)), Some("c"));
        assert!(q.is_empty());
        assert_eq!(q.next_deadline(), None);
    }
}
