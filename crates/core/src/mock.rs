//! Mock NVS backend for testing
//!
//! Provides an in-memory key-value backend with the same open/commit/close
//! semantics as the platform NVS engine. Supports:
//! - Namespaces created on first read-write open
//! - Per-handle pending mutations applied only on commit
//! - Failure injection for initialization and commit
//! - Commit and erase counters for flash wear checks

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::backend::{NvsBackend, NvsHandle, OpenMode, ScalarKind, MAX_KEY_LEN};
use crate::error::BackendError;

/// Bounded namespace or key name
pub type Name = heapless::String<MAX_KEY_LEN>;

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Scalar(ScalarKind, u64),
    Blob(Vec<u8>),
}

impl Entry {
    fn stored_len(&self) -> usize {
        match self {
            Entry::Scalar(kind, _) => kind.width(),
            Entry::Blob(data) => data.len(),
        }
    }
}

struct OpenHandle {
    namespace: Name,
    mode: OpenMode,
    /// Uncommitted mutations in call order; `None` erases the key
    pending: Vec<(Name, Option<Entry>)>,
}

struct MockState {
    initialized: bool,
    namespaces: BTreeSet<Name>,
    entries: BTreeMap<(Name, Name), Entry>,
    handles: BTreeMap<u32, OpenHandle>,
    next_handle: u32,
    /// Failures returned by successive `init` calls, oldest first
    init_failures: Vec<BackendError>,
    erase_failure: Option<BackendError>,
    commit_failure: Option<BackendError>,
    init_count: u32,
    partition_erase_count: u32,
    commit_count: u32,
}

impl MockState {
    fn handle(&self, handle: NvsHandle) -> Result<&OpenHandle, BackendError> {
        self.handles
            .get(&handle.0)
            .ok_or(BackendError::InvalidHandle)
    }

    fn writable(&mut self, handle: NvsHandle) -> Result<&mut OpenHandle, BackendError> {
        let open = self
            .handles
            .get_mut(&handle.0)
            .ok_or(BackendError::InvalidHandle)?;

        if open.mode != OpenMode::ReadWrite {
            return Err(BackendError::ReadOnly);
        }

        Ok(open)
    }

    /// Entry as seen through `handle`: its own pending mutations win over committed data
    fn lookup(&self, handle: NvsHandle, key: &str) -> Result<Option<Entry>, BackendError> {
        let open = self.handle(handle)?;
        let key = name(key)?;

        if let Some((_, pending)) = open.pending.iter().rev().find(|(k, _)| *k == key) {
            return Ok(pending.clone());
        }

        Ok(self.entries.get(&(open.namespace.clone(), key)).cloned())
    }

    fn stage(&mut self, handle: NvsHandle, key: &str, entry: Option<Entry>) -> Result<(), BackendError> {
        let key = name(key)?;
        self.writable(handle)?.pending.push((key, entry));
        Ok(())
    }
}

fn name(value: &str) -> Result<Name, BackendError> {
    Name::try_from(value).map_err(|_| BackendError::InvalidLength)
}

/// In-memory NVS backend
///
/// # Example
///
/// ```
/// use nvs_settings_core::backend::{NvsBackend, OpenMode, ScalarKind};
/// use nvs_settings_core::mock::MockNvs;
///
/// let nvs = MockNvs::new();
/// nvs.init().unwrap();
///
/// let handle = nvs.open("app", OpenMode::ReadWrite).unwrap();
/// nvs.set_scalar(handle, "volume", ScalarKind::U8, 7).unwrap();
/// nvs.commit(handle).unwrap();
/// nvs.close(handle);
///
/// assert_eq!(nvs.stored_len("app", "volume"), Some(1));
/// assert_eq!(nvs.commit_count(), 1);
/// ```
pub struct MockNvs {
    state: Mutex<CriticalSectionRawMutex, RefCell<MockState>>,
}

impl MockNvs {
    /// Create an empty, uninitialized mock partition
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(MockState {
                initialized: false,
                namespaces: BTreeSet::new(),
                entries: BTreeMap::new(),
                handles: BTreeMap::new(),
                next_handle: 1,
                init_failures: Vec::new(),
                erase_failure: None,
                commit_failure: None,
                init_count: 0,
                partition_erase_count: 0,
                commit_count: 0,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Make the next `init` call fail with `error`
    ///
    /// Repeated calls queue failures for successive `init` calls.
    pub fn inject_init_failure(&self, error: BackendError) {
        self.with(|s| s.init_failures.push(error));
    }

    /// Make the next `erase_partition` call fail with `error`
    pub fn inject_erase_failure(&self, error: BackendError) {
        self.with(|s| s.erase_failure = Some(error));
    }

    /// Make the next `commit` call fail with `error`
    pub fn inject_commit_failure(&self, error: BackendError) {
        self.with(|s| s.commit_failure = Some(error));
    }

    /// Number of `init` calls, failed ones included
    pub fn init_count(&self) -> u32 {
        self.with(|s| s.init_count)
    }

    /// Number of whole-partition erases
    pub fn partition_erase_count(&self) -> u32 {
        self.with(|s| s.partition_erase_count)
    }

    /// Number of successful commits (one flash write each)
    pub fn commit_count(&self) -> u32 {
        self.with(|s| s.commit_count)
    }

    /// Number of handles currently open
    pub fn open_handle_count(&self) -> usize {
        self.with(|s| s.handles.len())
    }

    /// Committed byte length of a key, `None` if absent
    pub fn stored_len(&self, namespace: &str, key: &str) -> Option<usize> {
        let (namespace, key) = (name(namespace).ok()?, name(key).ok()?);
        self.with(|s| s.entries.get(&(namespace, key)).map(Entry::stored_len))
    }

    /// Committed raw bytes of a blob key, `None` if absent or not a blob
    pub fn stored_blob(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        let (namespace, key) = (name(namespace).ok()?, name(key).ok()?);
        self.with(|s| match s.entries.get(&(namespace, key)) {
            Some(Entry::Blob(data)) => Some(data.clone()),
            _ => None,
        })
    }

    /// Number of committed keys in a namespace
    pub fn key_count(&self, namespace: &str) -> usize {
        self.with(|s| {
            s.entries
                .keys()
                .filter(|(ns, _)| ns.as_str() == namespace)
                .count()
        })
    }

    /// Store a committed scalar directly, bypassing handles
    pub fn preload_scalar(&self, namespace: &str, key: &str, kind: ScalarKind, bits: u64) {
        self.preload(namespace, key, Entry::Scalar(kind, bits & kind.mask()));
    }

    /// Store a committed blob directly, bypassing handles
    pub fn preload_blob(&self, namespace: &str, key: &str, data: &[u8]) {
        self.preload(namespace, key, Entry::Blob(data.to_vec()));
    }

    fn preload(&self, namespace: &str, key: &str, entry: Entry) {
        if let (Ok(namespace), Ok(key)) = (name(namespace), name(key)) {
            self.with(|s| {
                s.namespaces.insert(namespace.clone());
                s.entries.insert((namespace, key), entry);
            });
        }
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsBackend for MockNvs {
    fn init(&self) -> Result<(), BackendError> {
        self.with(|s| {
            s.init_count += 1;

            if !s.init_failures.is_empty() {
                return Err(s.init_failures.remove(0));
            }

            s.initialized = true;
            Ok(())
        })
    }

    fn erase_partition(&self) -> Result<(), BackendError> {
        self.with(|s| {
            if let Some(error) = s.erase_failure.take() {
                return Err(error);
            }

            s.namespaces.clear();
            s.entries.clear();
            s.handles.clear();
            s.initialized = false;
            s.partition_erase_count += 1;
            Ok(())
        })
    }

    fn open(&self, namespace: &str, mode: OpenMode) -> Result<NvsHandle, BackendError> {
        let namespace = name(namespace)?;

        self.with(|s| {
            if !s.initialized {
                return Err(BackendError::NotInitialized);
            }

            if !s.namespaces.contains(&namespace) {
                match mode {
                    OpenMode::ReadOnly => return Err(BackendError::NotFound),
                    OpenMode::ReadWrite => {
                        s.namespaces.insert(namespace.clone());
                    }
                }
            }

            let id = s.next_handle;
            s.next_handle = s.next_handle.wrapping_add(1);
            s.handles.insert(
                id,
                OpenHandle {
                    namespace,
                    mode,
                    pending: Vec::new(),
                },
            );

            Ok(NvsHandle(id))
        })
    }

    fn get_scalar(
        &self,
        handle: NvsHandle,
        key: &str,
        kind: ScalarKind,
    ) -> Result<u64, BackendError> {
        self.with(|s| match s.lookup(handle, key)? {
            Some(Entry::Scalar(stored, bits)) if stored == kind => Ok(bits),
            Some(_) => Err(BackendError::TypeMismatch),
            None => Err(BackendError::NotFound),
        })
    }

    fn set_scalar(
        &self,
        handle: NvsHandle,
        key: &str,
        kind: ScalarKind,
        bits: u64,
    ) -> Result<(), BackendError> {
        self.with(|s| s.stage(handle, key, Some(Entry::Scalar(kind, bits & kind.mask()))))
    }

    fn blob_len(&self, handle: NvsHandle, key: &str) -> Result<usize, BackendError> {
        self.with(|s| match s.lookup(handle, key)? {
            Some(Entry::Blob(data)) => Ok(data.len()),
            Some(Entry::Scalar(..)) => Err(BackendError::TypeMismatch),
            None => Err(BackendError::NotFound),
        })
    }

    fn get_blob(
        &self,
        handle: NvsHandle,
        key: &str,
        buf: &mut [u8],
    ) -> Result<usize, BackendError> {
        self.with(|s| match s.lookup(handle, key)? {
            Some(Entry::Blob(data)) => {
                if buf.len() < data.len() {
                    return Err(BackendError::InvalidLength);
                }

                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Entry::Scalar(..)) => Err(BackendError::TypeMismatch),
            None => Err(BackendError::NotFound),
        })
    }

    fn set_blob(&self, handle: NvsHandle, key: &str, data: &[u8]) -> Result<(), BackendError> {
        self.with(|s| s.stage(handle, key, Some(Entry::Blob(data.to_vec()))))
    }

    fn erase_key(&self, handle: NvsHandle, key: &str) -> Result<(), BackendError> {
        self.with(|s| {
            s.writable(handle)?;

            if s.lookup(handle, key)?.is_none() {
                return Err(BackendError::NotFound);
            }

            s.stage(handle, key, None)
        })
    }

    fn commit(&self, handle: NvsHandle) -> Result<(), BackendError> {
        self.with(|s| {
            s.writable(handle)?;

            if let Some(error) = s.commit_failure.take() {
                return Err(error);
            }

            let open = s.writable(handle)?;
            let namespace = open.namespace.clone();
            let pending = core::mem::take(&mut open.pending);

            for (key, entry) in pending {
                match entry {
                    Some(entry) => {
                        s.entries.insert((namespace.clone(), key), entry);
                    }
                    None => {
                        s.entries.remove(&(namespace.clone(), key));
                    }
                }
            }

            s.commit_count += 1;
            Ok(())
        })
    }

    fn close(&self, handle: NvsHandle) {
        self.with(|s| {
            s.handles.remove(&handle.0);
        });
    }
}
