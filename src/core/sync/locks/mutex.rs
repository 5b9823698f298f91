/*!
 * Scoped Mutex
 * Exclusive access through closures, with re-entrancy detection
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::atomic::AtomicCell;
use std::fmt;
use std::sync::atomic::Ordering;
use tracing::error;

const NO_OWNER: usize = 0;

thread_local! {
    static THREAD_TOKEN: u8 = const { 0 };
}

/// Non-zero token unique among live threads (address of a thread-local)
#[inline]
fn current_thread_token() -> usize {
    THREAD_TOKEN.with(|token| token as *const u8 as usize)
}

/// Mutual-exclusion wrapper exposing only scoped critical sections
///
/// The protected value is reachable only inside [`with_lock`](Self::with_lock)
/// or [`try_with_lock`](Self::try_with_lock), so it can never be observed
/// or mutated outside a critical section. The lock is released on every
/// exit path of the closure, including early returns of `Err` values and
/// panics (the underlying `parking_lot` mutex does not poison).
///
/// # Re-entrancy
///
/// Locking a mutex already held by the calling thread is a programming
/// error. `with_lock` panics instead of deadlocking; `try_with_lock`
/// reports [`SyncError::Reentrant`].
///
/// # Example
///
/// ```
/// use sync_core::Mutex;
///
/// let counter = Mutex::new(0u32);
/// let value = counter.with_lock(|n| {
///     *n += 1;
///     *n
/// });
/// assert_eq!(value, 1);
/// ```
pub struct Mutex<T> {
    /// Token of the holding thread, `NO_OWNER` when unlocked
    owner: AtomicCell<usize>,
    inner: parking_lot::Mutex<T>,
}

/// Clears the owner token when the critical section ends
struct OwnerMark<'a> {
    owner: &'a AtomicCell<usize>,
}

impl<'a> OwnerMark<'a> {
    #[inline]
    fn set(owner: &'a AtomicCell<usize>, token: usize) -> Self {
        owner.store(token, Ordering::Relaxed);
        Self { owner }
    }
}

impl Drop for OwnerMark<'_> {
    #[inline]
    fn drop(&mut self) {
        self.owner.store(NO_OWNER, Ordering::Relaxed);
    }
}

impl<T> Mutex<T> {
    /// Create a new unlocked mutex
    pub fn new(value: T) -> Self {
        Self {
            owner: AtomicCell::new(NO_OWNER),
            inner: parking_lot::Mutex::new(value),
        }
    }

    /// Run `f` with exclusive access, blocking until the lock is available
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this mutex.
    pub fn with_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let token = current_thread_token();
        if self.held_by(token) {
            error!("Re-entrant Mutex::with_lock detected");
            panic!("Mutex::with_lock called re-entrantly by the thread holding the lock");
        }

        let mut guard = self.inner.lock();
        // Dropped before `guard`, so the token is cleared while still locked
        let _mark = OwnerMark::set(&self.owner, token);
        f(&mut guard)
    }

    /// Run `f` with exclusive access only if the lock is free right now
    ///
    /// Never blocks. Returns [`SyncError::WouldBlock`] when another thread
    /// holds the lock and [`SyncError::Reentrant`] when the caller does.
    pub fn try_with_lock<F, R>(&self, f: F) -> SyncResult<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let token = current_thread_token();
        if self.held_by(token) {
            return Err(SyncError::Reentrant);
        }

        let mut guard = self.inner.try_lock().ok_or(SyncError::WouldBlock)?;
        let _mark = OwnerMark::set(&self.owner, token);
        Ok(f(&mut guard))
    }

    /// Whether some thread currently holds the lock (diagnostic only)
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Mutable access without locking; the exclusive borrow proves no sharing
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Consume the mutex and return the protected value
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    // Only the holding thread ever stores its own token, so a relaxed load
    // equal to ours can only be our own earlier write.
    #[inline]
    fn held_by(&self, token: usize) -> bool {
        self.owner.load(Ordering::Relaxed) == token
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Mutex<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.inner.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish()
    }
}
