//! Platform trait abstractions
//!
//! `TimeSource` and `MockTime` come from `nvs_settings_core`; this module adds
//! the shared-state wrapper used by settings entities.

pub mod sync;

pub use nvs_settings_core::traits::{MockTime, TimeSource};
pub use sync::{CriticalSectionState, SharedState};
