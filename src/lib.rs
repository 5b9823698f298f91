/*!
 * Sync Core Library
 * Concurrency primitives for application state containers
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{SyncError, SyncResult};
pub use crate::core::sync::{
    AtomicCell, AtomicNumeric, AtomicPrimitive, CacheConfig, CacheStats, Clock, ExpiringCache,
    Lease, LockFreeQueue, ManualClock, Mutex, RefCountedResource, SystemClock,
};
pub use monitoring::init_tracing;
