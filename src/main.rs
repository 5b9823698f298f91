/*!
 * Sync Core - Demonstration Entry Point
 *
 * Exercises every primitive from multiple threads and reports:
 * - Atomic counter totals
 * - Mutex-guarded counter totals
 * - Cache hit/expiry statistics
 * - Reference-counted cleanup
 * - Lock-free queue hand-off
 */

use anyhow::{ensure, Context, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

use sync_core::{
    init_tracing, AtomicCell, CacheConfig, ExpiringCache, LockFreeQueue, Mutex, RefCountedResource,
};

const THREADS: usize = 8;
const ITERATIONS: u64 = 100_000;

fn main() -> Result<()> {
    init_tracing();

    info!("Sync core demo starting...");
    info!("================================================");

    atomic_counter()?;
    mutex_counter()?;
    expiring_cache()?;
    ref_counted_resource()?;
    lock_free_queue()?;

    info!("================================================");
    info!("All primitives behaved as expected");
    Ok(())
}

fn join_all<T>(handles: Vec<thread::JoinHandle<T>>) -> Result<Vec<T>> {
    handles
        .into_iter()
        .map(|h| h.join().map_err(|_| anyhow::anyhow!("worker thread panicked")))
        .collect()
}

fn atomic_counter() -> Result<()> {
    let counter = Arc::new(AtomicCell::new(0u64));

    let handles = (0..THREADS)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();
    join_all(handles)?;

    let total = counter.load(Ordering::SeqCst);
    info!(total, "Atomic counter finished");
    ensure!(total == THREADS as u64 * ITERATIONS, "lost atomic updates: {}", total);
    Ok(())
}

fn mutex_counter() -> Result<()> {
    let counter = Arc::new(Mutex::new(0u64));

    let handles = (0..2)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    counter.with_lock(|n| *n += 1);
                }
            })
        })
        .collect();
    join_all(handles)?;

    let total = counter.with_lock(|n| *n);
    info!(total, "Mutex counter finished");
    ensure!(total == 2 * ITERATIONS, "mutex lost increments: {}", total);
    Ok(())
}

fn expiring_cache() -> Result<()> {
    let config = CacheConfig::from_env();
    let default_ttl_ms = u64::try_from(config.default_ttl.as_millis()).unwrap_or(u64::MAX);
    info!(default_ttl_ms, "Cache configured");

    let cache = ExpiringCache::with_config(config);
    cache.set_default("session", "active");
    cache.set("flash", "hello", Duration::ZERO);

    ensure!(cache.get("session") == Some("active"), "live entry missing");
    ensure!(cache.get("flash").is_none(), "zero-TTL entry served");

    let stats = cache.stats();
    info!(
        entries = stats.entries,
        accesses = stats.total_accesses,
        expirations = stats.expirations,
        hit_rate = stats.hit_rate(),
        "Cache statistics"
    );
    Ok(())
}

fn ref_counted_resource() -> Result<()> {
    let cleanups = Arc::new(AtomicCell::new(0u32));
    let cleanups_clone = cleanups.clone();
    let resource = Arc::new(RefCountedResource::new("render-surface", move |name| {
        info!(resource = *name, "Cleaning up resource");
        cleanups_clone.fetch_add(1, Ordering::SeqCst);
    }));

    let handles = (0..THREADS)
        .map(|_| {
            resource.retain();
            let resource = resource.clone();
            thread::spawn(move || {
                resource.release();
            })
        })
        .collect();
    resource.release();
    join_all(handles)?;

    let runs = cleanups.load(Ordering::SeqCst);
    ensure!(runs == 1, "cleanup ran {} times", runs);
    Ok(())
}

fn lock_free_queue() -> Result<()> {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 1_000;

    let queue = Arc::new(LockFreeQueue::new());

    let handles = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue((p, i));
                }
            })
        })
        .collect();
    join_all(handles)?;

    let mut seen = vec![vec![false; PER_PRODUCER]; PRODUCERS];
    let mut drained = 0usize;
    while let Some((p, i)) = queue.dequeue() {
        let slot = seen
            .get_mut(p)
            .and_then(|row| row.get_mut(i))
            .context("dequeued value out of range")?;
        ensure!(!*slot, "duplicate item ({}, {})", p, i);
        *slot = true;
        drained += 1;
    }

    info!(drained, "Queue drained");
    ensure!(drained == PRODUCERS * PER_PRODUCER, "lost queue items: {}", drained);
    Ok(())
}
