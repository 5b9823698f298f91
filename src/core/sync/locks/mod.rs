/*!
 * Lock-Based Synchronization Primitives
 *
 * Scoped mutual exclusion for multi-field consistency:
 * - Closure-based critical sections that always unlock
 * - Fail-fast re-entrancy detection
 */

mod mutex;

// Re-export public API
pub use mutex::Mutex;
