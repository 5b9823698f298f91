/*!
 * Reference-Counted Resource
 * Atomic lifetime counter with a one-shot cleanup on the final release
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::sync::atomic::AtomicCell;
use crate::core::sync::locks::Mutex;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{fence, Ordering};
use tracing::{debug, error, warn};

/// Counts above this are treated as a leak and abort via panic
const MAX_REFCOUNT: usize = isize::MAX as usize;

type Cleanup<T> = Box<dyn FnOnce(&T) + Send>;

/// Value whose lifetime is controlled by an explicit atomic reference count
///
/// The count starts at 1 (the creator's reference). `retain` adds a
/// reference and `release` drops one; the `release` that takes the count
/// from 1 to 0 runs the cleanup action exactly once and the resource is
/// unusable afterwards.
///
/// # Memory Ordering
///
/// Decrements use `Release` and the final one is followed by an `Acquire`
/// fence, so every write a thread made to the owned state before its
/// `release` is visible to the cleanup, whichever thread runs it.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use sync_core::RefCountedResource;
///
/// let cleaned = Arc::new(AtomicUsize::new(0));
/// let flag = cleaned.clone();
/// let resource = RefCountedResource::new("socket", move |_| {
///     flag.fetch_add(1, Ordering::SeqCst);
/// });
///
/// resource.retain();
/// assert!(!resource.release());
/// assert!(resource.release());
/// assert_eq!(cleaned.load(Ordering::SeqCst), 1);
/// ```
pub struct RefCountedResource<T> {
    count: AtomicCell<usize>,
    value: T,
    cleanup: Mutex<Option<Cleanup<T>>>,
}

impl<T> RefCountedResource<T> {
    /// Wrap `value` with a count of 1 and the given cleanup action
    pub fn new<F>(value: T, cleanup: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        Self {
            count: AtomicCell::new(1),
            value,
            cleanup: Mutex::new(Some(Box::new(cleanup))),
        }
    }

    /// Add a reference
    ///
    /// # Panics
    ///
    /// Panics if the resource was already released; a released resource is
    /// never resurrected.
    pub fn retain(&self) {
        if self.try_retain().is_err() {
            error!("retain() called on a released resource");
            panic!("RefCountedResource::retain called after the count reached zero");
        }
    }

    /// Add a reference, or report [`SyncError::Released`]
    pub fn try_retain(&self) -> SyncResult<()> {
        // Relaxed suffices: a new reference can only come from an existing one
        let prev = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n != 0).then(|| n + 1)
            })
            .map_err(|_| SyncError::Released)?;

        if prev >= MAX_REFCOUNT {
            error!(count = prev, "Reference count overflow");
            panic!("RefCountedResource reference count overflow");
        }
        Ok(())
    }

    /// Drop a reference, running cleanup if it was the last one
    ///
    /// Returns `true` only for the call that ran cleanup.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero.
    pub fn release(&self) -> bool {
        let prev = match self
            .count
            .fetch_update(Ordering::Release, Ordering::Relaxed, |n| n.checked_sub(1))
        {
            Ok(prev) => prev,
            Err(_) => {
                error!("release() called on a released resource");
                panic!("RefCountedResource::release called after the count reached zero");
            }
        };

        if prev != 1 {
            return false;
        }

        // Pairs with the Release decrements of every other holder
        fence(Ordering::Acquire);
        self.run_cleanup();
        true
    }

    /// Run `f` against the owned value while the resource is live
    ///
    /// Hold a [`Lease`] when the access must not race with the final
    /// release.
    pub fn with<F, R>(&self, f: F) -> SyncResult<R>
    where
        F: FnOnce(&T) -> R,
    {
        if self.is_released() {
            return Err(SyncError::Released);
        }
        Ok(f(&self.value))
    }

    /// Take a reference that is released automatically on drop
    pub fn lease(&self) -> SyncResult<Lease<'_, T>> {
        self.try_retain()?;
        Ok(Lease { resource: self })
    }

    /// Current count; diagnostic only, may be stale immediately
    #[inline]
    pub fn strong_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Whether the count has reached zero
    #[inline]
    pub fn is_released(&self) -> bool {
        self.count.load(Ordering::Acquire) == 0
    }

    fn run_cleanup(&self) {
        if let Some(cleanup) = self.cleanup.with_lock(Option::take) {
            cleanup(&self.value);
            debug!("Resource cleanup completed");
        }
    }
}

impl<T> Drop for RefCountedResource<T> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.get_mut().take() {
            warn!(
                remaining = self.count.load(Ordering::Relaxed),
                "Resource dropped with outstanding references, running cleanup"
            );
            cleanup(&self.value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RefCountedResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCountedResource")
            .field("count", &self.strong_count())
            .field("value", &self.value)
            .finish()
    }
}

/// Scoped reference to a [`RefCountedResource`]
///
/// Retained on creation, released on drop. Cloning retains again.
pub struct Lease<'a, T> {
    resource: &'a RefCountedResource<T>,
}

impl<'a, T> Lease<'a, T> {
    /// The resource this lease keeps alive
    pub fn resource(&self) -> &'a RefCountedResource<T> {
        self.resource
    }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.resource.value
    }
}

impl<T> Clone for Lease<'_, T> {
    fn clone(&self) -> Self {
        self.resource.retain();
        Self {
            resource: self.resource,
        }
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        self.resource.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Lease<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lease").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    fn counted<T>(value: T) -> (RefCountedResource<T>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let resource = RefCountedResource::new(value, move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (resource, calls)
    }

    #[test]
    fn test_single_release_runs_cleanup() {
        let (resource, calls) = counted(());
        assert_eq!(resource.strong_count(), 1);

        assert!(resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resource.is_released());
    }

    #[test]
    fn test_retain_then_two_releases() {
        let (resource, calls) = counted(());

        resource.retain();
        assert_eq!(resource.strong_count(), 2);

        assert!(!resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_retain_after_release() {
        let (resource, _) = counted(());
        resource.release();

        assert_eq!(resource.try_retain(), Err(SyncError::Released));
        assert_eq!(resource.strong_count(), 0);
    }

    #[test]
    #[should_panic(expected = "after the count reached zero")]
    fn test_retain_after_release_panics() {
        let (resource, _) = counted(());
        resource.release();
        resource.retain();
    }

    #[test]
    #[should_panic(expected = "after the count reached zero")]
    fn test_double_release_panics() {
        let (resource, _) = counted(());
        resource.release();
        resource.release();
    }

    #[test]
    fn test_with_rejects_released() {
        let (resource, _) = counted(41);

        assert_eq!(resource.with(|v| v + 1), Ok(42));
        resource.release();
        assert_eq!(resource.with(|v| v + 1), Err(SyncError::Released));
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let (resource, calls) = counted(String::from("handle"));

        {
            let lease = resource.lease().unwrap();
            let second = lease.clone();
            assert_eq!(&*second, "handle");
            assert_eq!(resource.strong_count(), 3);
        }

        assert_eq!(resource.strong_count(), 1);
        assert!(resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resource.lease().is_err());
    }

    #[test]
    fn test_lease_resource_shares_count() {
        let (resource, calls) = counted(5u8);
        let lease = resource.lease().unwrap();

        let owner = lease.resource();
        assert!(std::ptr::eq(owner, &resource));
        assert_eq!(owner.strong_count(), 2);
        assert_eq!(owner.with(|v| *v * 2), Ok(10));

        drop(lease);
        assert_eq!(resource.strong_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn test_retain_past_max_refcount_panics() {
        let resource = RefCountedResource {
            count: AtomicCell::new(MAX_REFCOUNT),
            value: (),
            cleanup: Mutex::new(None),
        };
        resource.retain();
    }

    #[test]
    fn test_try_retain_below_max_refcount() {
        let resource = RefCountedResource {
            count: AtomicCell::new(MAX_REFCOUNT - 1),
            value: (),
            cleanup: Mutex::new(None),
        };
        assert_eq!(resource.try_retain(), Ok(()));
        assert_eq!(resource.strong_count(), MAX_REFCOUNT);
    }

    #[test]
    fn test_final_lease_runs_cleanup() {
        let (resource, calls) = counted(());
        let lease = resource.lease().unwrap();

        assert!(!resource.release());
        drop(lease);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_without_release_runs_cleanup_once() {
        let (resource, calls) = counted(());
        resource.retain();
        drop(resource);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (resource, calls) = counted(());
        resource.release();
        drop(resource);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cleanup_sees_writes_before_release() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let resource = Arc::new(RefCountedResource::new(
            AtomicCell::new(0usize),
            move |total: &AtomicCell<usize>| {
                seen_clone.store(total.load(Ordering::Relaxed), Ordering::SeqCst);
            },
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                resource.retain();
                let resource = resource.clone();
                thread::spawn(move || {
                    resource.with(|total| total.fetch_add(1, Ordering::Relaxed)).unwrap();
                    resource.release();
                })
            })
            .collect();

        resource.release();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(resource.is_released());
        assert_eq!(seen.load(Ordering::SeqCst), 8);
    }
}
