//! Platform time sources
//!
//! - `StdTime` (`std` feature): host monotonic clock
//! - `EmbassyTime` (`embassy` feature): Embassy time driver

pub mod time;

#[cfg(feature = "embassy")]
pub use time::EmbassyTime;
#[cfg(feature = "std")]
pub use time::StdTime;
