//! Process-wide NVS partition with lazy one-time initialization
//!
//! A single [`NvsPartition`] wraps the platform backend and is meant to live in
//! a `static`. The first session opened in the process initializes the
//! partition; a partition that is full or was written by an incompatible
//! format version is erased and initialized again.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::backend::NvsBackend;
use crate::error::{BackendError, Result};

const STATE_UNINIT: u8 = 0;
const STATE_BUSY: u8 = 1;
const STATE_READY: u8 = 2;

/// Result of [`NvsPartition::ensure_initialized`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// An earlier call already initialized the partition
    AlreadyInitialized,
    /// Initialized on this call
    Initialized,
    /// Initialization reported the given status, the partition was erased and reinitialized
    Recovered(BackendError),
}

/// NVS partition shared by every settings entity in the process
///
/// # Example
///
/// ```
/// use nvs_settings_core::mock::MockNvs;
/// use nvs_settings_core::partition::{InitOutcome, NvsPartition};
///
/// static NVS: NvsPartition<MockNvs> = NvsPartition::new(MockNvs::new());
///
/// assert_eq!(NVS.ensure_initialized(), Ok(InitOutcome::Initialized));
/// assert_eq!(NVS.ensure_initialized(), Ok(InitOutcome::AlreadyInitialized));
/// ```
pub struct NvsPartition<B: NvsBackend> {
    backend: B,
    state: AtomicU8,
}

impl<B: NvsBackend> NvsPartition<B> {
    /// Wrap a backend; nothing touches flash until the first session opens
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            state: AtomicU8::new(STATE_UNINIT),
        }
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True once initialization has succeeded
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_READY
    }

    /// Initialize the partition unless already done
    ///
    /// Concurrent callers wait for the one performing initialization. A failed
    /// initialization leaves the partition uninitialized so the next session
    /// tries again.
    pub fn ensure_initialized(&self) -> Result<InitOutcome> {
        loop {
            match self.state.compare_exchange(
                STATE_UNINIT,
                STATE_BUSY,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let result = self.initialize();
                    let next = if result.is_ok() {
                        STATE_READY
                    } else {
                        STATE_UNINIT
                    };
                    self.state.store(next, Ordering::Release);
                    return result;
                }
                Err(STATE_READY) => return Ok(InitOutcome::AlreadyInitialized),
                Err(_) => core::hint::spin_loop(),
            }
        }
    }

    fn initialize(&self) -> Result<InitOutcome> {
        match self.backend.init() {
            Ok(()) => Ok(InitOutcome::Initialized),
            Err(status) if status.needs_erase() => {
                self.backend.erase_partition()?;
                self.backend.init()?;
                Ok(InitOutcome::Recovered(status))
            }
            Err(status) => Err(status.into()),
        }
    }
}
