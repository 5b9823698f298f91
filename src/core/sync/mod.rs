/*!
 * Synchronization Primitives
 *
 * Small, independently instantiable building blocks for shared state:
 * - `AtomicCell` for lock-free integers and flags with explicit ordering
 * - `Mutex` for scoped critical sections with re-entrancy detection
 * - `ExpiringCache` for TTL-bounded key/value storage
 * - `RefCountedResource` for atomic lifetime control with one-shot cleanup
 * - `LockFreeQueue` for unbounded MPMC FIFO hand-off
 *
 * # Architecture
 *
 * The leaves (`AtomicCell`, `Mutex`) carry all synchronization. The cache
 * composes one `Mutex` with atomic counters, the reference counter and the
 * queue are built on `AtomicCell`. There are no process-wide singletons.
 *
 * # Progress
 *
 * Only `Mutex` acquisition blocks. Every other operation is a bounded load,
 * store, or CAS retry loop.
 */

pub mod atomic;
pub mod cache;
mod config;
pub mod lockfree;
pub mod locks;
pub mod refcount;

pub use atomic::{AtomicCell, AtomicNumeric, AtomicPrimitive};
pub use cache::{CacheStats, Clock, ExpiringCache, ManualClock, SystemClock};
pub use config::{CacheConfig, ENV_DEFAULT_TTL_MS, ENV_INITIAL_CAPACITY};
pub use lockfree::LockFreeQueue;
pub use locks::Mutex;
pub use refcount::{Lease, RefCountedResource};
