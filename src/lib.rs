#![cfg_attr(not(feature = "std"), no_std)]

//! nvs_settings - Debounced, typed settings persistence for embedded devices
//!
//! Settings groups are persisted to a platform NVS key-value partition. Rapid
//! successive changes are coalesced into one flash write issued 2.5 s after
//! the last change, on a background worker, to limit flash wear.
//!
//! The platform-agnostic codec, sessions and debounce state machine live in
//! `nvs_settings_core`; this crate adds logging, real clocks and the
//! background flush workers.
//!
//! # Features
//!
//! - **`std`** (default): thread-based flush workers and `StdTime`
//! - **`embassy`**: task-based flush worker and `EmbassyTime`
//! - **`defmt`**: log through `defmt` instead of stdout

#[cfg(not(any(feature = "std", feature = "embassy")))]
compile_error!("enable the `std` or the `embassy` feature to get a flush worker");

pub mod logging;
pub mod platform;
pub mod settings;
pub mod traits;

pub use nvs_settings_core::{
    BackendError, MockNvs, NvsBackend, NvsError, NvsPartition, NvsRecord, NvsStream, NvsValue,
    Result, Settings, DEFAULT_WRITE_DELAY_US,
};
pub use settings::NvsSettings;
