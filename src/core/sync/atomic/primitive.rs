/*!
 * Atomic Storage Traits
 * Maps small fixed-width payloads onto their native std atomics
 *
 * Built with `--cfg loom`, the storage comes from `loom::sync::atomic`
 * so the model checker can explore every interleaving and every value a
 * weakly-ordered load may return.
 */

#[cfg(loom)]
use loom::sync::atomic;
#[cfg(not(loom))]
use std::sync::atomic;
use std::sync::atomic::Ordering;

/// A trivially-copyable payload with a native atomic representation
///
/// Implemented for `bool`, the fixed-width integers, `usize` and `isize`.
/// Every operation forwards to the matching `std::sync::atomic` type, so
/// ordering rules (and the panics for invalid orderings) are exactly the
/// standard library's.
pub trait AtomicPrimitive: Copy + Send + Sync + 'static {
    /// Native atomic backing this payload
    type Storage: Send + Sync;

    fn new_storage(value: Self) -> Self::Storage;
    fn load(storage: &Self::Storage, order: Ordering) -> Self;
    fn store(storage: &Self::Storage, value: Self, order: Ordering);
    fn swap(storage: &Self::Storage, value: Self, order: Ordering) -> Self;
    fn compare_exchange(
        storage: &Self::Storage,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
    fn compare_exchange_weak(
        storage: &Self::Storage,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
    // loom tracks every access, so it offers no unsynchronised borrow
    #[cfg(not(loom))]
    fn get_mut(storage: &mut Self::Storage) -> &mut Self;
    #[cfg(not(loom))]
    fn into_inner(storage: Self::Storage) -> Self;
}

/// Integer payloads supporting read-modify-write arithmetic
///
/// Arithmetic wraps on overflow, like the std atomics.
pub trait AtomicNumeric: AtomicPrimitive {
    fn fetch_add(storage: &Self::Storage, delta: Self, order: Ordering) -> Self;
    fn fetch_sub(storage: &Self::Storage, delta: Self, order: Ordering) -> Self;
    fn fetch_max(storage: &Self::Storage, value: Self, order: Ordering) -> Self;
    fn fetch_min(storage: &Self::Storage, value: Self, order: Ordering) -> Self;
}

macro_rules! impl_atomic_primitive {
    ($($ty:ty => $atomic:ty),* $(,)?) => {
        $(
            impl AtomicPrimitive for $ty {
                type Storage = $atomic;

                #[inline]
                fn new_storage(value: Self) -> Self::Storage {
                    <$atomic>::new(value)
                }

                #[inline(always)]
                fn load(storage: &Self::Storage, order: Ordering) -> Self {
                    storage.load(order)
                }

                #[inline(always)]
                fn store(storage: &Self::Storage, value: Self, order: Ordering) {
                    storage.store(value, order)
                }

                #[inline(always)]
                fn swap(storage: &Self::Storage, value: Self, order: Ordering) -> Self {
                    storage.swap(value, order)
                }

                #[inline(always)]
                fn compare_exchange(
                    storage: &Self::Storage,
                    current: Self,
                    new: Self,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<Self, Self> {
                    storage.compare_exchange(current, new, success, failure)
                }

                #[inline(always)]
                fn compare_exchange_weak(
                    storage: &Self::Storage,
                    current: Self,
                    new: Self,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<Self, Self> {
                    storage.compare_exchange_weak(current, new, success, failure)
                }

                #[cfg(not(loom))]
                #[inline]
                fn get_mut(storage: &mut Self::Storage) -> &mut Self {
                    storage.get_mut()
                }

                #[cfg(not(loom))]
                #[inline]
                fn into_inner(storage: Self::Storage) -> Self {
                    storage.into_inner()
                }
            }
        )*
    };
}

macro_rules! impl_atomic_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AtomicNumeric for $ty {
                #[inline(always)]
                fn fetch_add(storage: &Self::Storage, delta: Self, order: Ordering) -> Self {
                    storage.fetch_add(delta, order)
                }

                #[inline(always)]
                fn fetch_sub(storage: &Self::Storage, delta: Self, order: Ordering) -> Self {
                    storage.fetch_sub(delta, order)
                }

                #[inline(always)]
                fn fetch_max(storage: &Self::Storage, value: Self, order: Ordering) -> Self {
                    storage.fetch_max(value, order)
                }

                #[inline(always)]
                fn fetch_min(storage: &Self::Storage, value: Self, order: Ordering) -> Self {
                    storage.fetch_min(value, order)
                }
            }
        )*
    };
}

impl_atomic_primitive! {
    bool => atomic::AtomicBool,
    u8 => atomic::AtomicU8,
    u16 => atomic::AtomicU16,
    u32 => atomic::AtomicU32,
    u64 => atomic::AtomicU64,
    usize => atomic::AtomicUsize,
    i8 => atomic::AtomicI8,
    i16 => atomic::AtomicI16,
    i32 => atomic::AtomicI32,
    i64 => atomic::AtomicI64,
    isize => atomic::AtomicIsize,
}

impl_atomic_numeric!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
