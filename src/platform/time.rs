//! `TimeSource` implementations for real clocks

use nvs_settings_core::traits::TimeSource;

/// Host clock measuring from its creation
///
/// ```
/// use nvs_settings::platform::StdTime;
/// use nvs_settings::traits::TimeSource;
///
/// let time = StdTime::new();
/// let start = time.now_us();
/// assert!(time.now_us() >= start);
/// ```
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdTime {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTime {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdTime {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Embassy time driver clock
#[cfg(feature = "embassy")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTime;

#[cfg(feature = "embassy")]
impl TimeSource for EmbassyTime {
    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
