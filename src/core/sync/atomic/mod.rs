/*!
 * Atomic Cells
 *
 * Lock-free storage for small fixed-width values (integers, flags):
 * - Explicit memory ordering on every operation
 * - Read-modify-write arithmetic for integer payloads
 * - Compare-exchange that reports the observed value for retry loops
 */

mod cell;
mod primitive;

// Re-export public API
pub use cell::AtomicCell;
pub use primitive::{AtomicNumeric, AtomicPrimitive};
