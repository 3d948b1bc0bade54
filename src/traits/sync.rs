//! Synchronized state access
//!
//! The in-memory values of a settings entity are touched by the application
//! and by the background flush worker. `SharedState` hides the lock behind
//! closure-based access so no guard can be held across a flash write.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Closure-based access to state shared between execution contexts
///
/// # Example
///
/// ```
/// use nvs_settings::traits::sync::{CriticalSectionState, SharedState};
///
/// let state = CriticalSectionState::new(41u32);
/// state.with_mut(|v| *v += 1);
/// assert_eq!(state.with(|v| *v), 42);
/// ```
pub trait SharedState<T> {
    /// Access state immutably
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// State guarded by a critical-section mutex
///
/// Interrupt-safe on embedded targets; backed by a process-wide lock on the
/// host (`critical-section/std`).
pub struct CriticalSectionState<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T> CriticalSectionState<T> {
    /// Wrap a value; usable in `static` initializers
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }
}

impl<T: Clone> CriticalSectionState<T> {
    /// Copy of the current value
    pub fn snapshot(&self) -> T {
        self.with(T::clone)
    }

    /// Replace the current value
    pub fn replace(&self, value: T) -> T {
        self.with_mut(|current| core::mem::replace(current, value))
    }
}

impl<T> SharedState<T> for CriticalSectionState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
