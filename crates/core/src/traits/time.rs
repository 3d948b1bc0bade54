//! Monotonic time source used to compute write deadlines

use alloc::sync::Arc;
use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Monotonic clock in microseconds since an arbitrary start point
///
/// Implemented by `StdTime` on the host and `EmbassyTime` on Embassy targets,
/// and by [`MockTime`] in tests.
pub trait TimeSource: Clone + Send + Sync {
    /// Current time in microseconds
    fn now_us(&self) -> u64;
}

/// Manually advanced clock for deterministic tests
///
/// Clones share the same clock, so a test can keep one copy and hand another
/// to the code under test.
///
/// # Example
///
/// ```
/// use nvs_settings_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// let shared = time.clone();
///
/// time.advance(2_500_000);
/// assert_eq!(shared.now_us(), 2_500_000);
/// ```
#[derive(Clone)]
pub struct MockTime {
    current_us: Arc<Mutex<CriticalSectionRawMutex, Cell<u64>>>,
}

impl MockTime {
    /// Clock starting at 0
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    /// Clock starting at `us`
    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Arc::new(Mutex::new(Cell::new(us))),
        }
    }

    /// Set the absolute time
    pub fn set(&self, us: u64) {
        self.current_us.lock(|now| now.set(us));
    }

    /// Move the clock forward
    pub fn advance(&self, us: u64) {
        self.current_us
            .lock(|now| now.set(now.get().saturating_add(us)));
    }
}

impl Default for MockTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MockTime {
    fn now_us(&self) -> u64 {
        self.current_us.lock(|now| now.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_starts_at_zero() {
        let time = MockTime::new();
        assert_eq!(time.now_us(), 0);
    }

    #[test]
    fn mock_time_clones_share_clock() {
        let time = MockTime::with_initial(1_000);
        let other = time.clone();

        other.advance(1_500);
        assert_eq!(time.now_us(), 2_500);

        time.set(10_000);
        assert_eq!(other.now_us(), 10_000);
    }
}
