/*!
 * Expiring Caches
 *
 * Mutex-protected key/value storage with per-entry time-to-live:
 * - Lazy eviction on lookup (no background sweeper)
 * - Atomic access counters kept outside the critical section
 * - Injectable clock for deterministic expiry
 */

mod clock;
mod expiring;

// Re-export public API
pub use clock::{Clock, ManualClock, SystemClock};
pub use expiring::{CacheStats, ExpiringCache};
