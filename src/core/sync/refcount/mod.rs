/*!
 * Reference Counting
 *
 * Explicit atomic lifetime control for shared resources:
 * - One-shot cleanup on the final release
 * - RAII leases in place of captured back-references
 */

mod resource;

// Re-export public API
pub use resource::{Lease, RefCountedResource};
