use std::time::{Duration, Instant};

/// Identifies one scheduled action so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TimerHandle,
    deadline: Instant,
    value: T,
}

/// Cancel-then-restart timer holding at most one pending value
///
/// Time is supplied by the caller, which keeps the engine free of any
/// runtime and makes the behaviour deterministic under test.
#[derive(Debug)]
pub struct Debouncer<T> {
    next_handle: u64,
    scheduled: Option<Scheduled<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debouncer<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            scheduled: None,
        }
    }

    /// Schedule `value` to fire `delay` after `now`, replacing anything pending
    pub fn schedule(&mut self, now: Instant, delay: Duration, value: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.scheduled = Some(Scheduled {
            handle,
            deadline: now + delay,
            value,
        });
        handle
    }

    /// Cancel a pending action; stale handles are ignored
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let matches = self.scheduled.as_ref().is_some_and(|s| s.handle == handle);
        if matches {
            self.scheduled = None;
        }
        matches
    }

    pub fn is_pending(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.scheduled.as_ref().map(|s| s.deadline)
    }

    /// Take the pending value once its deadline has passed
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        let due = self.scheduled.as_ref().is_some_and(|s| s.deadline <= now);
        if due {
            self.flush()
        } else {
            None
        }
    }

    /// Take the pending value regardless of its deadline
    pub fn flush(&mut self) -> Option<T> {
        self.scheduled.take().map(|s| s.value)
    }
}
