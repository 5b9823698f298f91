/*!
 * Lock-Free Synchronization Primitives
 *
 * Non-blocking data structures built from compare-and-swap:
 * - Michael-Scott MPMC queue with epoch-based reclamation
 * - Helping protocol for a lagging tail pointer
 */

mod queue;

// Re-export public API
pub use queue::LockFreeQueue;
