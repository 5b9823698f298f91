/*!
 * Atomic Cell
 * Lock-free storage cell for small fixed-width values with explicit ordering
 */

use super::primitive::{AtomicNumeric, AtomicPrimitive};
use std::fmt;
use std::sync::atomic::Ordering;

/// Lock-free cell holding one small `Copy` value
///
/// Every operation takes the memory ordering explicitly. Observers only ever
/// see values written by a completed store; there are no torn writes.
///
/// # Ordering
///
/// A `Relaxed` store paired with a `Relaxed` load of a flag says nothing
/// about the data written around that flag. Publish with `Release` (or
/// stronger) and observe with `Acquire` (or stronger) when the flag guards
/// other memory.
///
/// # Example
///
/// ```
/// use std::sync::atomic::Ordering;
/// use sync_core::AtomicCell;
///
/// let hits = AtomicCell::new(0u64);
/// hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(hits.load(Ordering::Relaxed), 1);
/// ```
#[repr(transparent)]
pub struct AtomicCell<T: AtomicPrimitive> {
    inner: T::Storage,
}

impl<T: AtomicPrimitive> AtomicCell<T> {
    /// Create a cell holding `value`
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            inner: T::new_storage(value),
        }
    }

    /// Load the current value
    ///
    /// Panics on `Release` or `AcqRel`, as std atomics do.
    #[inline(always)]
    pub fn load(&self, order: Ordering) -> T {
        T::load(&self.inner, order)
    }

    /// Publish a new value
    ///
    /// Panics on `Acquire` or `AcqRel`, as std atomics do.
    #[inline(always)]
    pub fn store(&self, value: T, order: Ordering) {
        T::store(&self.inner, value, order)
    }

    /// Store `value` and return the previous one
    #[inline(always)]
    pub fn swap(&self, value: T, order: Ordering) -> T {
        T::swap(&self.inner, value, order)
    }

    /// Replace the value with `new` iff it currently equals `current`
    ///
    /// Returns `Ok(previous)` when the exchange happened and
    /// `Err(observed)` otherwise, so retry loops can continue from the
    /// observed value without an extra load.
    #[inline]
    pub fn compare_exchange(
        &self,
        current: T,
        new: T,
        success: Ordering,
        failure: Ordering,
    ) -> Result<T, T> {
        T::compare_exchange(&self.inner, current, new, success, failure)
    }

    /// Like [`compare_exchange`](Self::compare_exchange) but may fail
    /// spuriously; cheaper inside loops on some platforms.
    #[inline]
    pub fn compare_exchange_weak(
        &self,
        current: T,
        new: T,
        success: Ordering,
        failure: Ordering,
    ) -> Result<T, T> {
        T::compare_exchange_weak(&self.inner, current, new, success, failure)
    }

    /// Apply `f` in a CAS loop until it succeeds or `f` returns `None`
    ///
    /// Returns `Ok(previous)` on success, `Err(last_observed)` when `f`
    /// declined. `f` may run several times under contention.
    pub fn fetch_update<F>(&self, set_order: Ordering, fetch_order: Ordering, mut f: F) -> Result<T, T>
    where
        F: FnMut(T) -> Option<T>,
    {
        let mut prev = self.load(fetch_order);
        while let Some(next) = f(prev) {
            match self.compare_exchange_weak(prev, next, set_order, fetch_order) {
                Ok(previous) => return Ok(previous),
                Err(observed) => prev = observed,
            }
        }
        Err(prev)
    }

    /// Mutable access without atomics; exclusive borrow proves no sharing
    #[cfg(not(loom))]
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        T::get_mut(&mut self.inner)
    }

    /// Consume the cell and return its value
    #[cfg(not(loom))]
    #[inline]
    pub fn into_inner(self) -> T {
        T::into_inner(self.inner)
    }
}

impl<T: AtomicNumeric> AtomicCell<T> {
    /// Add `delta` (wrapping) and return the prior value
    #[inline(always)]
    pub fn fetch_add(&self, delta: T, order: Ordering) -> T {
        T::fetch_add(&self.inner, delta, order)
    }

    /// Subtract `delta` (wrapping) and return the prior value
    #[inline(always)]
    pub fn fetch_sub(&self, delta: T, order: Ordering) -> T {
        T::fetch_sub(&self.inner, delta, order)
    }

    /// Store the maximum of the current value and `value`, returning the prior value
    #[inline]
    pub fn fetch_max(&self, value: T, order: Ordering) -> T {
        T::fetch_max(&self.inner, value, order)
    }

    /// Store the minimum of the current value and `value`, returning the prior value
    #[inline]
    pub fn fetch_min(&self, value: T, order: Ordering) -> T {
        T::fetch_min(&self.inner, value, order)
    }
}

impl AtomicCell<bool> {
    /// Logical AND, returning the prior value
    #[inline]
    pub fn fetch_and(&self, value: bool, order: Ordering) -> bool {
        self.inner.fetch_and(value, order)
    }

    /// Logical OR, returning the prior value
    #[inline]
    pub fn fetch_or(&self, value: bool, order: Ordering) -> bool {
        self.inner.fetch_or(value, order)
    }

    /// Logical XOR, returning the prior value
    #[inline]
    pub fn fetch_xor(&self, value: bool, order: Ordering) -> bool {
        self.inner.fetch_xor(value, order)
    }
}

impl<T: AtomicPrimitive + Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: AtomicPrimitive> From<T> for AtomicCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: AtomicPrimitive + fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCell")
            .field(&self.load(Ordering::SeqCst))
            .finish()
    }
}
