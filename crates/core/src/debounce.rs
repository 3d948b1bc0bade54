//! Debounced write deadline
//!
//! Bursts of setting changes are coalesced into a single flash write that
//! happens a fixed quiet period after the most recent change. This module holds
//! the deadline state machine; spawning and sleeping are left to the platform
//! worker that drives it.
//!
//! # Protocol
//!
//! ```text
//! schedule(now) ──► deadline = now + delay ──► true if no worker was pending
//!                                                 │
//!   worker: loop { poll(now) } ◄──────────────────┘
//!              │ Wait(us): sleep `us`, poll again
//!              │ Flush:    deadline cleared, run the write once, exit
//! ```
//!
//! Both `schedule` and `poll` run inside one critical section each, so the
//! worker can never clear a deadline that a concurrent `schedule` just moved
//! into the future, and a `schedule` issued while the write runs arms a fresh
//! worker.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Quiet period between the last change and the flush (2.5 s)
pub const DEFAULT_WRITE_DELAY_US: u64 = 2_500_000;

/// Outcome of [`WriteDebouncer::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPoll {
    /// Deadline not reached; sleep this many microseconds and poll again
    Wait(u64),
    /// Deadline reached and cleared; perform the write now
    Flush,
}

/// Single deferred-write deadline of one settings entity
pub struct WriteDebouncer {
    delay_us: u64,
    /// `None` when no flush is pending
    deadline_us: Mutex<CriticalSectionRawMutex, Cell<Option<u64>>>,
}

impl WriteDebouncer {
    /// Debouncer with the default 2.5 s quiet period
    pub const fn new() -> Self {
        Self::with_delay(DEFAULT_WRITE_DELAY_US)
    }

    /// Debouncer with a custom quiet period
    pub const fn with_delay(delay_us: u64) -> Self {
        Self {
            delay_us,
            deadline_us: Mutex::new(Cell::new(None)),
        }
    }

    /// Pending flush deadline, if any
    pub fn deadline(&self) -> Option<u64> {
        self.deadline_us.lock(|deadline| deadline.get())
    }

    /// True while a flush is armed and has not started yet
    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }

    /// Arm or extend the deadline to `now_us + delay`
    ///
    /// Returns true when no flush was pending, meaning the caller must start a
    /// worker. When a worker is already waiting, moving the deadline is enough.
    pub fn schedule(&self, now_us: u64) -> bool {
        let next = now_us.saturating_add(self.delay_us);

        self.deadline_us
            .lock(|deadline| deadline.replace(Some(next)).is_none())
    }

    /// Check the deadline from the worker
    ///
    /// Returns [`FlushPoll::Flush`] exactly once per armed deadline, clearing it
    /// in the same critical section. A worker finding no deadline flushes too,
    /// so every activation ends in exactly one write.
    pub fn poll(&self, now_us: u64) -> FlushPoll {
        self.deadline_us.lock(|deadline| match deadline.get() {
            Some(at) if now_us < at => FlushPoll::Wait(at - now_us),
            _ => {
                deadline.set(None);
                FlushPoll::Flush
            }
        })
    }
}

impl Default for WriteDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockTime, TimeSource};

    const MS: u64 = 1_000;

    /// Drive the worker loop against mock time, returning the flush time
    fn run_worker(debouncer: &WriteDebouncer, time: &MockTime) -> u64 {
        loop {
            match debouncer.poll(time.now_us()) {
                FlushPoll::Wait(us) => time.advance(us),
                FlushPoll::Flush => return time.now_us(),
            }
        }
    }

    #[test]
    fn test_first_schedule_starts_worker() {
        let debouncer = WriteDebouncer::new();
        assert!(!debouncer.is_pending());

        assert!(debouncer.schedule(0));
        assert_eq!(debouncer.deadline(), Some(DEFAULT_WRITE_DELAY_US));
    }

    #[test]
    fn test_burst_coalesces_to_last_call() {
        let debouncer = WriteDebouncer::new();
        let time = MockTime::new();

        let mut spawned = 0;
        for _ in 0..5 {
            if debouncer.schedule(time.now_us()) {
                spawned += 1;
            }
            time.advance(20 * MS);
        }

        // Fifth call happened at 80 ms
        assert_eq!(spawned, 1);
        assert_eq!(debouncer.deadline(), Some(80 * MS + DEFAULT_WRITE_DELAY_US));

        let flushed_at = run_worker(&debouncer, &time);
        assert_eq!(flushed_at, 80 * MS + DEFAULT_WRITE_DELAY_US);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_wait_reports_remaining_time() {
        let debouncer = WriteDebouncer::with_delay(100 * MS);
        debouncer.schedule(0);

        assert_eq!(debouncer.poll(30 * MS), FlushPoll::Wait(70 * MS));
        assert_eq!(debouncer.poll(99 * MS), FlushPoll::Wait(MS));
        assert_eq!(debouncer.poll(100 * MS), FlushPoll::Flush);
    }

    #[test]
    fn test_extension_while_worker_sleeps() {
        let debouncer = WriteDebouncer::with_delay(100 * MS);
        let time = MockTime::new();

        assert!(debouncer.schedule(0));
        assert_eq!(debouncer.poll(time.now_us()), FlushPoll::Wait(100 * MS));

        // Worker sleeps 100 ms; another change lands at 60 ms
        time.advance(60 * MS);
        assert!(!debouncer.schedule(time.now_us()));
        time.advance(40 * MS);

        // Woken at the old deadline, the worker goes back to sleep
        assert_eq!(debouncer.poll(time.now_us()), FlushPoll::Wait(60 * MS));
        assert_eq!(run_worker(&debouncer, &time), 160 * MS);
    }

    #[test]
    fn test_past_deadline_flushes_immediately() {
        let debouncer = WriteDebouncer::new();
        debouncer.schedule(1_000);

        assert_eq!(debouncer.poll(10_000_000), FlushPoll::Flush);
    }

    #[test]
    fn test_flush_clears_before_write_so_rescheduling_arms_again() {
        let debouncer = WriteDebouncer::with_delay(100 * MS);
        let time = MockTime::new();

        debouncer.schedule(0);
        assert_eq!(run_worker(&debouncer, &time), 100 * MS);

        // A change made while the write runs needs a new worker
        assert!(debouncer.schedule(time.now_us()));
        assert!(!debouncer.schedule(time.now_us()));
        assert_eq!(run_worker(&debouncer, &time), 200 * MS);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_poll_without_deadline_flushes_once() {
        let debouncer = WriteDebouncer::new();
        assert_eq!(debouncer.poll(0), FlushPoll::Flush);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_deadline_saturates() {
        let debouncer = WriteDebouncer::new();
        debouncer.schedule(u64::MAX - 1);
        assert_eq!(debouncer.deadline(), Some(u64::MAX));
    }
}
