//! nvs_settings_core - Typed settings persistence over an NVS key-value backend
//!
//! This crate contains the platform-agnostic part of the settings system and
//! can be tested on host without feature flags.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives
//! - **no_std + alloc**: Strings and scratch buffers use `alloc`
//! - **Trait abstractions**: The storage engine and the clock are injected via traits
//!
//! # Modules
//!
//! - [`backend`]: Key-value backend capability (`NvsBackend`) and name limits
//! - [`partition`]: Process-wide partition with one-time initialization and recovery
//! - [`stream`]: Namespace session and typed codec (`NvsStream`)
//! - [`record`]: Fixed-layout records stored as blob arrays
//! - [`value`]: Dynamically typed values
//! - [`settings`]: `Settings` extension point for settings groups
//! - [`debounce`]: Debounced write deadline state machine
//! - [`traits`]: `TimeSource` and `MockTime`
//! - [`mock`]: In-memory `MockNvs` backend
//! - [`error`]: Backend status codes and codec errors

#![no_std]

extern crate alloc;

pub mod backend;
pub mod debounce;
pub mod error;
pub mod mock;
pub mod partition;
pub mod record;
pub mod settings;
pub mod stream;
pub mod traits;
pub mod value;

pub use backend::{NvsBackend, NvsHandle, OpenMode, ScalarKind, MAX_KEY_LEN};
pub use debounce::{FlushPoll, WriteDebouncer, DEFAULT_WRITE_DELAY_US};
pub use error::{BackendError, NvsError, Result};
pub use mock::MockNvs;
pub use partition::{InitOutcome, NvsPartition};
pub use record::NvsRecord;
pub use settings::Settings;
pub use stream::NvsStream;
pub use value::NvsValue;
