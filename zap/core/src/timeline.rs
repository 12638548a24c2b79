//! Cooperative Timeline
//!
//! A virtual clock plus an ordered set of pending timers. The animator never
//! reads the wall clock or sleeps; hosts move time forward with
//! [`Timeline::pop_due`] (usually through `ZapAnimator::advance`), and timers
//! fire in `(due, scheduling order)` order.
//!
//! Handles are plain values. Cancelling a handle that already fired, or was
//! already cancelled, is a no-op.

use std::collections::BTreeMap;
use std::time::Duration;

/// Opaque handle to a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    due_ms: u64,
    id: u64,
}

impl TimerHandle {
    /// Virtual time (ms) at which the timer fires
    #[must_use]
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Ordered set of pending timers carrying payloads of type `E`
#[derive(Debug)]
pub struct Timeline<E> {
    now_ms: u64,
    next_id: u64,
    pending: BTreeMap<TimerHandle, E>,
}

impl<E> Timeline<E> {
    /// Create an empty timeline at time zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `event` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, event: E) -> TimerHandle {
        let handle = TimerHandle {
            due_ms: self.now_ms.saturating_add(delay_ms),
            id: self.next_id,
        };
        self.next_id += 1;
        self.pending.insert(handle, event);
        handle
    }

    /// Cancel a pending timer, returning its payload if it had not fired yet
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<E> {
        self.pending.remove(&handle)
    }

    /// Whether the timer is still pending
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Number of pending timers
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timers are pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Due time of the earliest pending timer
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.keys().next().map(|h| h.due_ms)
    }

    /// Pop the earliest timer due at or before `until_ms`
    ///
    /// Moves the clock to the popped timer's due time. Returns `None` once
    /// nothing is due; the caller then settles the clock with
    /// [`Timeline::settle`].
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerHandle, E)> {
        let handle = *self.pending.keys().next()?;
        if handle.due_ms > until_ms {
            return None;
        }
        let event = self.pending.remove(&handle)?;
        self.now_ms = self.now_ms.max(handle.due_ms);
        Some((handle, event))
    }

    /// Move the clock forward to `until_ms` (never backwards)
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Target time `delta` after now
    #[must_use]
    pub fn deadline_after(&self, delta: Duration) -> u64 {
        let delta_ms = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        self.now_ms.saturating_add(delta_ms)
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timeline: &mut Timeline<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        while let Some((handle, event)) = timeline.pop_due(until) {
            fired.push((handle.due_ms(), event));
        }
        timeline.settle(until);
        fired
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(300, "c");
        timeline.schedule(100, "a");
        timeline.schedule(200, "b");

        assert_eq!(drain(&mut timeline, 1000), vec![(100, "a"), (200, "b"), (300, "c")]);
        assert_eq!(timeline.now_ms(), 1000);
    }

    #[test]
    fn test_same_due_fires_in_scheduling_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(50, "first");
        timeline.schedule(50, "second");
        assert_eq!(drain(&mut timeline, 50), vec![(50, "first"), (50, "second")]);
    }

    #[test]
    fn test_not_due_stays_pending() {
        let mut timeline = Timeline::new();
        let handle = timeline.schedule(500, "later");
        assert!(drain(&mut timeline, 499).is_empty());
        assert!(timeline.is_pending(handle));
        assert_eq!(drain(&mut timeline, 500), vec![(500, "later")]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timeline = Timeline::new();
        let handle = timeline.schedule(10, "x");
        assert_eq!(timeline.cancel(handle), Some("x"));
        assert_eq!(timeline.cancel(handle), None);
        assert!(drain(&mut timeline, 100).is_empty());
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let mut timeline = Timeline::new();
        timeline.settle(1000);
        let handle = timeline.schedule(250, "x");
        assert_eq!(handle.due_ms(), 1250);
        assert_eq!(timeline.next_due_ms(), Some(1250));
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut timeline: Timeline<()> = Timeline::new();
        timeline.settle(500);
        timeline.settle(100);
        assert_eq!(timeline.now_ms(), 500);
    }
}
