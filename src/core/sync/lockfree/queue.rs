/*!
 * Lock-Free MPMC Queue
 * Michael-Scott linked queue with epoch-based node reclamation
 */

use crate::core::sync::atomic::AtomicCell;
use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::Deref;
use std::sync::atomic::Ordering;

/// Keeps head and tail on separate cache lines
#[repr(align(128))]
struct Padded<T>(T);

impl<T> Deref for Padded<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

/// List node; `data` is uninitialised for the sentinel and once moved out
struct Node<T> {
    data: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            data: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }
}

/// Unbounded multi-producer multi-consumer FIFO queue
///
/// # Algorithm
///
/// The list always starts with a sentinel node; `head` points at it and the
/// first element lives in `head.next`. `tail` may lag one node behind the
/// real last node. Any thread that sees the lag advances `tail` before
/// retrying its own operation, so no thread ever waits on another.
///
/// # Reclamation
///
/// Nodes unlinked by `dequeue` are handed to `crossbeam_epoch`, which frees
/// them only after every thread pinned at unlink time has unpinned. No node
/// is freed while another thread may still dereference it.
///
/// # Performance
///
/// - **enqueue**: one allocation, one successful CAS (plus a best-effort tail CAS)
/// - **dequeue**: one successful CAS, deferred free
/// - **empty dequeue**: two loads, never blocks
pub struct LockFreeQueue<T> {
    head: Padded<Atomic<Node<T>>>,
    tail: Padded<Atomic<Node<T>>>,
    /// Approximate element count; may over-count, never underflows
    len: AtomicCell<usize>,
}

// Safety: values move between threads but are only ever read by the single
// dequeuer that unlinked them, so `T: Send` is enough for both.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        // SAFETY: the queue is not shared yet, nothing can race on the sentinel
        let sentinel = unsafe { Owned::new(Node::sentinel()).into_shared(epoch::unprotected()) };

        Self {
            head: Padded(Atomic::from(sentinel)),
            tail: Padded(Atomic::from(sentinel)),
            len: AtomicCell::new(0),
        }
    }

    /// Append `value` at the tail
    pub fn enqueue(&self, value: T) {
        // Counted before linking so a racing dequeue can never underflow it
        self.len.fetch_add(1, Ordering::Relaxed);

        let guard = &epoch::pin();
        let new = Owned::new(Node {
            data: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: tail is never null and the pin keeps it allocated
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if !next.is_null() {
                // Tail lags behind the last node: help it forward, then retry
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            if tail_ref
                .next
                .compare_exchange(
                    Shared::null(),
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                )
                .is_ok()
            {
                // Best effort; whoever sees the lag next finishes this step
                let _ = self.tail.compare_exchange(
                    tail,
                    new,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                return;
            }
        }
    }

    /// Remove the value at the head, or `None` when empty
    ///
    /// Never blocks.
    pub fn dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();
        self.dequeue_with(guard)
    }

    fn dequeue_with(&self, guard: &Guard) -> Option<T> {
        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: head is never null and the guard keeps it allocated
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);
            // SAFETY: a non-null successor is kept alive by the same guard
            let next_ref = unsafe { next.as_ref() }?;

            if head == tail {
                // An enqueue linked a node but has not moved tail yet
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                self.len.fetch_sub(1, Ordering::Relaxed);
                // SAFETY: winning the head CAS gives this thread sole ownership
                // of `next.data`; `next` becomes the new sentinel and its data
                // is never read again. The old head is unreachable for new
                // readers and freed once current pins are gone.
                unsafe {
                    guard.defer_destroy(head);
                    return Some(next_ref.data.assume_init_read());
                }
            }
        }
    }

    /// Whether the queue held no elements at the instant of the check
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // SAFETY: head is never null and the guard keeps it allocated
        unsafe { head.deref() }.next.load(Ordering::Acquire, guard).is_null()
    }

    /// Approximate number of elements
    ///
    /// Exact when no operation is in flight; may briefly over-count while
    /// an enqueue is linking its node.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` proves no other thread can access the queue, so
        // the unprotected guard frees nodes immediately and safely.
        unsafe {
            let guard = epoch::unprotected();
            while self.dequeue_with(guard).is_some() {}

            let sentinel = self.head.load(Ordering::Relaxed, guard);
            drop(sentinel.into_owned());
        }
    }
}

impl<T> fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
