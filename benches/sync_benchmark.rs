/*!
 * Synchronization Primitives Benchmarks
 *
 * Compare atomic vs mutex counters, cache lookups, and the lock-free queue
 * against crossbeam's SegQueue
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crossbeam_queue::SegQueue;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sync_core::{AtomicCell, ExpiringCache, LockFreeQueue, Mutex};

const OPS_PER_THREAD: usize = 10_000;

fn bench_counters(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_counter");

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("atomic_cell", threads), &threads, |b, &threads| {
            b.iter(|| {
                let counter = Arc::new(AtomicCell::new(0u64));
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let counter = counter.clone();
                        thread::spawn(move || {
                            for _ in 0..OPS_PER_THREAD {
                                counter.fetch_add(1, Ordering::Relaxed);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(counter.load(Ordering::Relaxed))
            });
        });

        group.bench_with_input(BenchmarkId::new("mutex", threads), &threads, |b, &threads| {
            b.iter(|| {
                let counter = Arc::new(Mutex::new(0u64));
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let counter = counter.clone();
                        thread::spawn(move || {
                            for _ in 0..OPS_PER_THREAD {
                                counter.with_lock(|n| *n += 1);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(counter.with_lock(|n| *n))
            });
        });
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("expiring_cache");

    let cache = ExpiringCache::new();
    for key in 0..1024u32 {
        cache.set(key, key, Duration::from_secs(3600));
    }

    group.bench_function("get_hit", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = (key + 1) % 1024;
            black_box(cache.get(&key))
        });
    });

    group.bench_function("get_miss", |b| {
        b.iter(|| black_box(cache.get(&u32::MAX)));
    });

    group.bench_function("set", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = (key + 1) % 1024;
            cache.set(black_box(key), key, Duration::from_secs(3600));
        });
    });

    group.finish();
}

fn bench_queues(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_queue");

    for producers in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::new("lock_free_queue", producers),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let queue = Arc::new(LockFreeQueue::new());
                    let handles: Vec<_> = (0..producers)
                        .map(|_| {
                            let queue = queue.clone();
                            thread::spawn(move || {
                                for i in 0..OPS_PER_THREAD {
                                    queue.enqueue(i);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                    let mut drained = 0;
                    while queue.dequeue().is_some() {
                        drained += 1;
                    }
                    black_box(drained)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_seg_queue", producers),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let queue = Arc::new(SegQueue::new());
                    let handles: Vec<_> = (0..producers)
                        .map(|_| {
                            let queue = queue.clone();
                            thread::spawn(move || {
                                for i in 0..OPS_PER_THREAD {
                                    queue.push(i);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                    let mut drained = 0;
                    while queue.pop().is_some() {
                        drained += 1;
                    }
                    black_box(drained)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_counters, bench_cache, bench_queues);
criterion_main!(benches);
