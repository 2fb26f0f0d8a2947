//! Simulated-time task queue.
//!
//! Pacing delays (animation holds, opponent thinking time) are modeled as
//! tasks due at a point on a millisecond clock that only moves when the
//! owner advances it. Tests step time explicitly instead of sleeping.
//!
//! Tasks due at the same instant run in the order they were scheduled.
//! There is no cancellation; a scheduled task always comes out.
//!
//! ```
//! use dark_horse::schedule::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule(500, "b");
//! scheduler.schedule(100, "a");
//!
//! assert_eq!(scheduler.pop_due(50), None);
//! assert_eq!(scheduler.pop_due(1000), Some("a"));
//! assert_eq!(scheduler.now(), 100);
//! assert_eq!(scheduler.pop_due(1000), Some("b"));
//! assert!(scheduler.is_idle());
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

struct Entry<T> {
    due: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Delayed tasks on a simulated millisecond clock.
pub struct Scheduler<T> {
    now: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `task` once `delay` milliseconds have elapsed.
    pub fn schedule(&mut self, delay: u64, task: T) {
        let entry = Entry {
            due: self.now.saturating_add(delay),
            seq: self.next_seq,
            task,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let due = self.next_due()?;
        if due > until {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Pop the earliest task regardless of how far ahead it is.
    pub fn pop_next(&mut self) -> Option<T> {
        self.pop_due(u64::MAX)
    }

    /// Move the clock forward without running anything.
    pub fn advance_to(&mut self, time: u64) {
        self.now = self.now.max(time);
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> std::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_due_time() {
        let mut s = Scheduler::new();
        s.schedule(300, 3);
        s.schedule(100, 1);
        s.schedule(200, 2);

        let order: Vec<_> = std::iter::from_fn(|| s.pop_next()).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(s.now(), 300);
    }

    #[test]
    fn test_same_instant_is_fifo() {
        let mut s = Scheduler::new();
        s.schedule(100, "first");
        s.schedule(100, "second");
        s.schedule(0, "now");

        assert_eq!(s.pop_next(), Some("now"));
        assert_eq!(s.pop_next(), Some("first"));
        assert_eq!(s.pop_next(), Some("second"));
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut s = Scheduler::new();
        s.advance_to(1000);
        s.schedule(500, ());

        assert_eq!(s.next_due(), Some(1500));
        assert_eq!(s.pop_due(1499), None);
        assert_eq!(s.pop_due(1500), Some(()));
    }

    #[test]
    fn test_clock_never_goes_back() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(200);
        s.advance_to(100);
        assert_eq!(s.now(), 200);
    }

    #[test]
    fn test_idle() {
        let mut s = Scheduler::new();
        assert!(s.is_idle());
        s.schedule(10, ());
        assert_eq!(s.pending(), 1);
        s.pop_next();
        assert!(s.is_idle());
    }
}
