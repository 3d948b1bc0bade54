//! Namespace session and typed codec
//!
//! An [`NvsStream`] owns one open namespace handle for the duration of a single
//! read or write pass and translates typed values to and from the backend's
//! scalar and blob operations.
//!
//! # Encoding
//!
//! | Type          | Backend slot | Stored bytes                    |
//! |---------------|--------------|---------------------------------|
//! | integers      | scalar       | natural width                   |
//! | `bool`        | u8 scalar    | 1 (`0` or `1`)                  |
//! | `f32`         | u32 scalar   | 4 (IEEE-754 bit pattern)        |
//! | string        | blob         | content + one `0x00` terminator |
//! | record array  | blob         | `SIZE * count`                  |
//! | blob          | blob         | length of the data              |
//!
//! Every typed read takes a default that is returned when the key (or the
//! whole namespace) does not exist. Any other backend status is an error.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::backend::{validate_name, NvsBackend, NvsHandle, OpenMode, ScalarKind};
use crate::error::{BackendError, NvsError, Result};
use crate::partition::NvsPartition;
use crate::record::NvsRecord;
use crate::value::NvsValue;

/// Terminator byte appended to stored strings
const STRING_TERMINATOR: u8 = 0;

/// Open session on one namespace
///
/// Created by [`NvsStream::open_for_reading`] or [`NvsStream::open_for_writing`].
/// Mutations made through a write session persist only if [`NvsStream::commit`]
/// is called before the session is closed. Dropping a session closes it.
///
/// # Example
///
/// ```
/// use nvs_settings_core::mock::MockNvs;
/// use nvs_settings_core::partition::NvsPartition;
/// use nvs_settings_core::stream::NvsStream;
///
/// let nvs = NvsPartition::new(MockNvs::new());
///
/// let stream = NvsStream::open_for_writing(&nvs, "display").unwrap();
/// stream.write_u8("brightness", 7).unwrap();
/// stream.write_string("theme", "dark").unwrap();
/// stream.commit().unwrap();
/// stream.close();
///
/// let stream = NvsStream::open_for_reading(&nvs, "display").unwrap();
/// assert_eq!(stream.read_u8("brightness", 0).unwrap(), 7);
/// assert_eq!(stream.read_u8("contrast", 9).unwrap(), 9);
/// assert_eq!(stream.read_string("theme", "light").unwrap(), "dark");
/// stream.close();
/// ```
pub struct NvsStream<'a, B: NvsBackend> {
    nvs: &'a NvsPartition<B>,
    /// `None` for a read session on a namespace that does not exist yet
    handle: Option<NvsHandle>,
    mode: OpenMode,
}

impl<'a, B: NvsBackend> NvsStream<'a, B> {
    /// Open a namespace for reading
    ///
    /// A namespace that was never written yields a session in which every key
    /// is absent.
    pub fn open_for_reading(nvs: &'a NvsPartition<B>, namespace: &str) -> Result<Self> {
        validate_name(namespace)?;
        nvs.ensure_initialized()?;

        let handle = match nvs.backend().open(namespace, OpenMode::ReadOnly) {
            Ok(handle) => Some(handle),
            Err(BackendError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            nvs,
            handle,
            mode: OpenMode::ReadOnly,
        })
    }

    /// Open a namespace for reading and writing, creating it if needed
    pub fn open_for_writing(nvs: &'a NvsPartition<B>, namespace: &str) -> Result<Self> {
        validate_name(namespace)?;
        nvs.ensure_initialized()?;

        let handle = nvs.backend().open(namespace, OpenMode::ReadWrite)?;

        Ok(Self {
            nvs,
            handle: Some(handle),
            mode: OpenMode::ReadWrite,
        })
    }

    /// False for a read session on a namespace that has never been written
    pub fn namespace_exists(&self) -> bool {
        self.handle.is_some()
    }

    /// Make every mutation of this session durable
    pub fn commit(&self) -> Result<()> {
        let handle = self.writable_handle()?;
        self.backend().commit(handle)?;
        Ok(())
    }

    /// Close the session, discarding uncommitted mutations
    pub fn close(mut self) {
        if let Some(handle) = self.handle.take() {
            self.nvs.backend().close(handle);
        }
    }

    fn backend(&self) -> &B {
        self.nvs.backend()
    }

    fn writable_handle(&self) -> Result<NvsHandle> {
        match (self.mode, self.handle) {
            (OpenMode::ReadWrite, Some(handle)) => Ok(handle),
            _ => Err(NvsError::Backend(BackendError::ReadOnly)),
        }
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    fn read_scalar(&self, key: &str, kind: ScalarKind) -> Result<Option<u64>> {
        validate_name(key)?;

        let Some(handle) = self.handle else {
            return Ok(None);
        };

        match self.backend().get_scalar(handle, key, kind) {
            Ok(bits) => Ok(Some(bits)),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_scalar(&self, key: &str, kind: ScalarKind, bits: u64) -> Result<()> {
        validate_name(key)?;
        let handle = self.writable_handle()?;
        self.backend().set_scalar(handle, key, kind, bits)?;
        Ok(())
    }

    /// Read a `u8`, or `default` if the key is absent
    pub fn read_u8(&self, key: &str, default: u8) -> Result<u8> {
        Ok(self
            .read_scalar(key, ScalarKind::U8)?
            .map_or(default, |bits| bits as u8))
    }

    /// Write a `u8`
    pub fn write_u8(&self, key: &str, value: u8) -> Result<()> {
        self.write_scalar(key, ScalarKind::U8, value as u64)
    }

    /// Read an `i8`, or `default` if the key is absent
    pub fn read_i8(&self, key: &str, default: i8) -> Result<i8> {
        Ok(self
            .read_scalar(key, ScalarKind::I8)?
            .map_or(default, |bits| bits as i8))
    }

    /// Write an `i8`
    pub fn write_i8(&self, key: &str, value: i8) -> Result<()> {
        self.write_scalar(key, ScalarKind::I8, value as i64 as u64)
    }

    /// Read a `u16`, or `default` if the key is absent
    pub fn read_u16(&self, key: &str, default: u16) -> Result<u16> {
        Ok(self
            .read_scalar(key, ScalarKind::U16)?
            .map_or(default, |bits| bits as u16))
    }

    /// Write a `u16`
    pub fn write_u16(&self, key: &str, value: u16) -> Result<()> {
        self.write_scalar(key, ScalarKind::U16, value as u64)
    }

    /// Read an `i16`, or `default` if the key is absent
    pub fn read_i16(&self, key: &str, default: i16) -> Result<i16> {
        Ok(self
            .read_scalar(key, ScalarKind::I16)?
            .map_or(default, |bits| bits as i16))
    }

    /// Write an `i16`
    pub fn write_i16(&self, key: &str, value: i16) -> Result<()> {
        self.write_scalar(key, ScalarKind::I16, value as i64 as u64)
    }

    /// Read a `u32`, or `default` if the key is absent
    pub fn read_u32(&self, key: &str, default: u32) -> Result<u32> {
        Ok(self
            .read_scalar(key, ScalarKind::U32)?
            .map_or(default, |bits| bits as u32))
    }

    /// Write a `u32`
    pub fn write_u32(&self, key: &str, value: u32) -> Result<()> {
        self.write_scalar(key, ScalarKind::U32, value as u64)
    }

    /// Read an `i32`, or `default` if the key is absent
    pub fn read_i32(&self, key: &str, default: i32) -> Result<i32> {
        Ok(self
            .read_scalar(key, ScalarKind::I32)?
            .map_or(default, |bits| bits as i32))
    }

    /// Write an `i32`
    pub fn write_i32(&self, key: &str, value: i32) -> Result<()> {
        self.write_scalar(key, ScalarKind::I32, value as i64 as u64)
    }

    /// Read a `u64`, or `default` if the key is absent
    pub fn read_u64(&self, key: &str, default: u64) -> Result<u64> {
        Ok(self.read_scalar(key, ScalarKind::U64)?.unwrap_or(default))
    }

    /// Write a `u64`
    pub fn write_u64(&self, key: &str, value: u64) -> Result<()> {
        self.write_scalar(key, ScalarKind::U64, value)
    }

    /// Read an `i64`, or `default` if the key is absent
    pub fn read_i64(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self
            .read_scalar(key, ScalarKind::I64)?
            .map_or(default, |bits| bits as i64))
    }

    /// Write an `i64`
    pub fn write_i64(&self, key: &str, value: i64) -> Result<()> {
        self.write_scalar(key, ScalarKind::I64, value as u64)
    }

    /// Read an `f32` stored as its bit pattern in a u32 slot
    pub fn read_f32(&self, key: &str, default: f32) -> Result<f32> {
        Ok(self
            .read_scalar(key, ScalarKind::U32)?
            .map_or(default, |bits| f32::from_bits(bits as u32)))
    }

    /// Write an `f32` as its bit pattern in a u32 slot
    pub fn write_f32(&self, key: &str, value: f32) -> Result<()> {
        self.write_u32(key, value.to_bits())
    }

    /// Read a `bool` stored in a u8 slot; any non-zero byte is `true`
    pub fn read_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .read_scalar(key, ScalarKind::U8)?
            .map_or(default, |bits| bits as u8 != 0))
    }

    /// Write a `bool` as `0` or `1` in a u8 slot
    pub fn write_bool(&self, key: &str, value: bool) -> Result<()> {
        self.write_u8(key, value as u8)
    }

    // ------------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------------

    /// Read a string
    ///
    /// The stored terminator byte is stripped; interior `0x00` bytes are kept.
    pub fn read_string(&self, key: &str, default: &str) -> Result<String> {
        let length = match self.stored_blob_len(key)? {
            Some(length) => length,
            None => return Ok(String::from(default)),
        };

        let mut buf = vec![0u8; length];
        if !self.fill_blob(key, &mut buf)? {
            return Ok(String::from(default));
        }

        if buf.last() == Some(&STRING_TERMINATOR) {
            buf.pop();
        }

        String::from_utf8(buf).map_err(|_| NvsError::InvalidUtf8)
    }

    /// Write a string as its bytes followed by one terminator byte
    pub fn write_string(&self, key: &str, value: &str) -> Result<()> {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(STRING_TERMINATOR);

        self.write_blob(key, &data)
    }

    // ------------------------------------------------------------------------
    // Blobs and record arrays
    // ------------------------------------------------------------------------

    fn stored_blob_len(&self, key: &str) -> Result<Option<usize>> {
        validate_name(key)?;

        let Some(handle) = self.handle else {
            return Ok(None);
        };

        match self.backend().blob_len(handle, key) {
            Ok(length) => Ok(Some(length)),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fill `buf` with the stored blob; false if the key is absent
    fn fill_blob(&self, key: &str, buf: &mut [u8]) -> Result<bool> {
        let Some(handle) = self.handle else {
            return Ok(false);
        };

        match self.backend().get_blob(handle, key, buf) {
            Ok(copied) if copied == buf.len() => Ok(true),
            Ok(_) | Err(BackendError::InvalidLength) => Err(NvsError::LengthMismatch),
            Err(BackendError::NotFound) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored blob length in bytes, 0 if the key is absent
    pub fn read_blob_length(&self, key: &str) -> Result<usize> {
        Ok(self.stored_blob_len(key)?.unwrap_or(0))
    }

    /// Read a blob into `buf`, whose length must equal the stored length
    ///
    /// Returns false, leaving `buf` untouched, if the key is absent.
    pub fn read_blob(&self, key: &str, buf: &mut [u8]) -> Result<bool> {
        match self.stored_blob_len(key)? {
            None => Ok(false),
            Some(length) if length != buf.len() => Err(NvsError::LengthMismatch),
            Some(_) => self.fill_blob(key, buf),
        }
    }

    /// Store raw bytes, replacing any prior value of the key
    pub fn write_blob(&self, key: &str, data: &[u8]) -> Result<()> {
        validate_name(key)?;
        let handle = self.writable_handle()?;
        self.backend().set_blob(handle, key, data)?;
        Ok(())
    }

    /// Number of `T` records stored under `key`, 0 if absent
    pub fn read_object_count<T: NvsRecord>(&self, key: &str) -> Result<usize> {
        let length = self.read_blob_length(key)?;

        if T::SIZE == 0 || length % T::SIZE != 0 {
            return Err(NvsError::LengthMismatch);
        }

        Ok(length / T::SIZE)
    }

    /// Read records into `out`, whose length must equal
    /// [`read_object_count`](Self::read_object_count)
    ///
    /// Returns false, leaving `out` untouched, if the key is absent.
    pub fn read_objects<T: NvsRecord>(&self, key: &str, out: &mut [T]) -> Result<bool> {
        let mut bytes = vec![0u8; out.len() * T::SIZE];

        if !self.read_blob(key, &mut bytes)? {
            return Ok(false);
        }

        for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(T::SIZE)) {
            *slot = T::decode(chunk);
        }

        Ok(true)
    }

    /// Write records as `SIZE * items.len()` raw bytes
    pub fn write_objects<T: NvsRecord>(&self, key: &str, items: &[T]) -> Result<()> {
        let mut bytes = vec![0u8; items.len() * T::SIZE];

        for (item, chunk) in items.iter().zip(bytes.chunks_exact_mut(T::SIZE)) {
            item.encode(chunk);
        }

        self.write_blob(key, &bytes)
    }

    // ------------------------------------------------------------------------
    // Keys and dynamic values
    // ------------------------------------------------------------------------

    /// Remove a key; erasing an absent key is not an error
    pub fn erase(&self, key: &str) -> Result<()> {
        validate_name(key)?;
        let handle = self.writable_handle()?;

        match self.backend().erase_key(handle, key) {
            Ok(()) | Err(BackendError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a value of the same type as `default`
    pub fn read_value(&self, key: &str, default: NvsValue) -> Result<NvsValue> {
        Ok(match default {
            NvsValue::U8(d) => NvsValue::U8(self.read_u8(key, d)?),
            NvsValue::I8(d) => NvsValue::I8(self.read_i8(key, d)?),
            NvsValue::U16(d) => NvsValue::U16(self.read_u16(key, d)?),
            NvsValue::I16(d) => NvsValue::I16(self.read_i16(key, d)?),
            NvsValue::U32(d) => NvsValue::U32(self.read_u32(key, d)?),
            NvsValue::I32(d) => NvsValue::I32(self.read_i32(key, d)?),
            NvsValue::U64(d) => NvsValue::U64(self.read_u64(key, d)?),
            NvsValue::I64(d) => NvsValue::I64(self.read_i64(key, d)?),
            NvsValue::F32(d) => NvsValue::F32(self.read_f32(key, d)?),
            NvsValue::Bool(d) => NvsValue::Bool(self.read_bool(key, d)?),
            NvsValue::Str(d) => NvsValue::Str(self.read_string(key, &d)?),
            NvsValue::Blob(d) => match self.stored_blob_len(key)? {
                None => NvsValue::Blob(d),
                Some(length) => {
                    let mut buf = vec![0u8; length];
                    if self.fill_blob(key, &mut buf)? {
                        NvsValue::Blob(buf)
                    } else {
                        NvsValue::Blob(d)
                    }
                }
            },
        })
    }

    /// Write a value with the encoding of its type
    pub fn write_value(&self, key: &str, value: &NvsValue) -> Result<()> {
        match value {
            NvsValue::U8(v) => self.write_u8(key, *v),
            NvsValue::I8(v) => self.write_i8(key, *v),
            NvsValue::U16(v) => self.write_u16(key, *v),
            NvsValue::I16(v) => self.write_i16(key, *v),
            NvsValue::U32(v) => self.write_u32(key, *v),
            NvsValue::I32(v) => self.write_i32(key, *v),
            NvsValue::U64(v) => self.write_u64(key, *v),
            NvsValue::I64(v) => self.write_i64(key, *v),
            NvsValue::F32(v) => self.write_f32(key, *v),
            NvsValue::Bool(v) => self.write_bool(key, *v),
            NvsValue::Str(v) => self.write_string(key, v),
            NvsValue::Blob(v) => self.write_blob(key, v),
        }
    }
}

impl<B: NvsBackend> Drop for NvsStream<'_, B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.nvs.backend().close(handle);
        }
    }
}
