//! Persistent key-value backend capability
//!
//! The flash-backed storage engine (page management, wear leveling, on-disk
//! format) belongs to the platform. This module only describes the operations
//! the codec needs from it.
//!
//! # Contract
//!
//! - Keys live inside namespaces; both names are at most [`MAX_KEY_LEN`] bytes
//! - Scalars are stored at their natural width, blobs as raw bytes with the
//!   length tracked by the backend
//! - Mutations through a handle become durable only after [`NvsBackend::commit`];
//!   closing an uncommitted handle discards them
//! - `NotFound` from [`NvsBackend::open`] is only legal in [`OpenMode::ReadOnly`]

use crate::error::{BackendError, NvsError};

/// Maximum namespace and key name length in bytes (NVS limit, excluding terminator)
pub const MAX_KEY_LEN: usize = 15;

/// Namespace open mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only; mutations fail with [`BackendError::ReadOnly`]
    ReadOnly,
    /// Reads and writes
    ReadWrite,
}

/// Opaque handle to an open namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NvsHandle(pub u32);

/// Native scalar slot types of the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl ScalarKind {
    /// Stored width in bytes
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 => 4,
            ScalarKind::U64 | ScalarKind::I64 => 8,
        }
    }

    /// Bit mask selecting the stored width out of a 64-bit slot
    pub const fn mask(self) -> u64 {
        match self.width() {
            8 => u64::MAX,
            w => (1u64 << (w * 8)) - 1,
        }
    }
}

/// Platform key-value storage engine
///
/// Implementations are shared by every session in the process and must be
/// internally synchronized, which is why every method takes `&self`.
///
/// Scalar values cross this interface as a 64-bit slot: the backend keeps the
/// low [`ScalarKind::width`] bytes and returns them zero-extended.
pub trait NvsBackend: Sync {
    /// Initialize the partition
    ///
    /// Returns [`BackendError::NoFreePages`] or [`BackendError::NewVersionFound`]
    /// when the partition must be erased before it can be used.
    fn init(&self) -> Result<(), BackendError>;

    /// Erase the whole partition
    fn erase_partition(&self) -> Result<(), BackendError>;

    /// Open a namespace
    fn open(&self, namespace: &str, mode: OpenMode) -> Result<NvsHandle, BackendError>;

    /// Read a scalar slot
    fn get_scalar(&self, handle: NvsHandle, key: &str, kind: ScalarKind)
        -> Result<u64, BackendError>;

    /// Write a scalar slot, replacing any prior value of the key
    fn set_scalar(
        &self,
        handle: NvsHandle,
        key: &str,
        kind: ScalarKind,
        bits: u64,
    ) -> Result<(), BackendError>;

    /// Stored length of a blob in bytes
    fn blob_len(&self, handle: NvsHandle, key: &str) -> Result<usize, BackendError>;

    /// Copy a blob into `buf`, returning the number of bytes copied
    ///
    /// Fails with [`BackendError::InvalidLength`] if `buf` is shorter than the
    /// stored blob.
    fn get_blob(&self, handle: NvsHandle, key: &str, buf: &mut [u8])
        -> Result<usize, BackendError>;

    /// Store a blob, replacing any prior value of the key
    fn set_blob(&self, handle: NvsHandle, key: &str, data: &[u8]) -> Result<(), BackendError>;

    /// Remove a key
    fn erase_key(&self, handle: NvsHandle, key: &str) -> Result<(), BackendError>;

    /// Make pending mutations durable
    fn commit(&self, handle: NvsHandle) -> Result<(), BackendError>;

    /// Release the handle, discarding uncommitted mutations
    fn close(&self, handle: NvsHandle);
}

/// Validate a namespace or key name against backend limits
pub fn validate_name(name: &str) -> Result<(), NvsError> {
    if name.is_empty() {
        return Err(NvsError::EmptyKey);
    }

    if name.len() > MAX_KEY_LEN {
        return Err(NvsError::KeyTooLong);
    }

    Ok(())
}
