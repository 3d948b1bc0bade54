//! Settings entities
//!
//! [`NvsSettings`] is the composition root: it owns the in-memory values of
//! one [`Settings`](nvs_settings_core::Settings) group, reads and writes them
//! through namespace sessions, and coalesces change notifications into
//! debounced background writes.

pub mod entity;
mod worker;

pub use entity::NvsSettings;
