//! Error types
//!
//! `BackendError` carries the status codes a persistent key-value backend can
//! report. `NvsError` is what the codec and session layer return to callers.

use core::fmt;

/// Result type for codec and session operations
pub type Result<T> = core::result::Result<T, NvsError>;

/// Status codes reported by an [`NvsBackend`](crate::backend::NvsBackend)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    /// Key or namespace does not exist
    NotFound,
    /// Partition has no free pages left (must be erased)
    NoFreePages,
    /// Partition was written by an incompatible format version (must be erased)
    NewVersionFound,
    /// Partition has not been initialized
    NotInitialized,
    /// Handle is not open
    InvalidHandle,
    /// Mutation attempted through a read-only handle
    ReadOnly,
    /// Stored entry has a different type than requested
    TypeMismatch,
    /// Destination buffer length does not match the stored length
    InvalidLength,
    /// Backend has no room for the value
    NotEnoughSpace,
    /// Underlying flash operation failed
    Io,
}

impl BackendError {
    /// Short description, usable from `defmt` log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendError::NotFound => "not found",
            BackendError::NoFreePages => "no free pages",
            BackendError::NewVersionFound => "new version found",
            BackendError::NotInitialized => "not initialized",
            BackendError::InvalidHandle => "invalid handle",
            BackendError::ReadOnly => "read-only handle",
            BackendError::TypeMismatch => "type mismatch",
            BackendError::InvalidLength => "invalid length",
            BackendError::NotEnoughSpace => "not enough space",
            BackendError::Io => "flash I/O failure",
        }
    }

    /// True for the statuses that are recovered by erasing the partition
    pub fn needs_erase(&self) -> bool {
        matches!(self, BackendError::NoFreePages | BackendError::NewVersionFound)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from codec and session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvsError {
    /// Backend reported a failure other than "not found"
    Backend(BackendError),
    /// Key or namespace name exceeds [`MAX_KEY_LEN`](crate::backend::MAX_KEY_LEN)
    KeyTooLong,
    /// Key or namespace name is empty
    EmptyKey,
    /// Stored string is not valid UTF-8
    InvalidUtf8,
    /// Stored length is not a multiple of the record size, or does not fit the buffer
    LengthMismatch,
}

impl NvsError {
    /// Short description, usable from `defmt` log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            NvsError::Backend(e) => e.as_str(),
            NvsError::KeyTooLong => "key too long",
            NvsError::EmptyKey => "empty key",
            NvsError::InvalidUtf8 => "stored string is not UTF-8",
            NvsError::LengthMismatch => "stored length mismatch",
        }
    }
}

impl fmt::Display for NvsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NvsError::Backend(e) => write!(f, "NVS backend error: {}", e),
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<BackendError> for NvsError {
    fn from(error: BackendError) -> Self {
        NvsError::Backend(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_backend_error_conversion() {
        let err: NvsError = BackendError::Io.into();
        assert_eq!(err, NvsError::Backend(BackendError::Io));
    }

    #[test]
    fn test_needs_erase() {
        assert!(BackendError::NoFreePages.needs_erase());
        assert!(BackendError::NewVersionFound.needs_erase());
        assert!(!BackendError::Io.needs_erase());
        assert!(!BackendError::NotFound.needs_erase());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            NvsError::Backend(BackendError::ReadOnly).to_string(),
            "NVS backend error: read-only handle"
        );
        assert_eq!(NvsError::KeyTooLong.to_string(), "key too long");
    }
}
