//! Platform-agnostic trait abstractions
//!
//! Trait definitions carry no feature gates. Mock implementations are always
//! available for host testing; platform implementations (`StdTime`,
//! `EmbassyTime`) live in the `nvs_settings` crate.

pub mod time;

pub use time::{MockTime, TimeSource};
