use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use spin_pk::{
    Backoff, DistributedId, DistributedIdGenerator, IdGenStatus, IdType, SPIN_EPOCH, SystemClock,
    TimeSource,
};
use std::{sync::Arc, thread::scope, time::Instant};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// Benchmarks the hot path where every call is `Ready`. A fresh generator per
/// iteration keeps the sequence from running out.
fn bench_fixed_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_time");

    for id_type in [IdType::MaxPeak, IdType::MinGranularity] {
        // One time unit only holds `seq_mask + 1` ids.
        let per_iter = TOTAL_IDS.min(id_type.meta().seq_mask() as usize + 1);
        group.throughput(Throughput::Elements(per_iter as u64));
        group.bench_function(format!("{id_type}/elems/{per_iter}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let generator = DistributedIdGenerator::new(
                        1,
                        id_type,
                        FixedMockTime {
                            millis: SPIN_EPOCH.as_millis() as u64,
                        },
                    )
                    .unwrap();
                    for _ in 0..per_iter {
                        match generator.try_next_id() {
                            Ok(IdGenStatus::Ready { id }) => {
                                black_box(id);
                            }
                            _ => unreachable!(),
                        }
                    }
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks wall-clock generation, including waits on exhausted sequences.
fn bench_system_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("system_clock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator = DistributedIdGenerator::new(1, IdType::MinGranularity, SystemClock).unwrap();
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.next_id(Backoff::Spin).unwrap());
            }
        });
    });

    for threads in [2, 4, 8] {
        let generator =
            Arc::new(DistributedIdGenerator::new(1, IdType::MinGranularity, SystemClock).unwrap());
        group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));
        group.bench_function(format!("threads/{threads}/elems/{TOTAL_IDS}"), |b| {
            b.iter(|| {
                scope(|s| {
                    for _ in 0..threads {
                        let generator = Arc::clone(&generator);
                        s.spawn(move || {
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id(Backoff::Yield).unwrap());
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

fn bench_expand(c: &mut Criterion) {
    let raw = DistributedId::new(IdType::MaxPeak, 123_456, 789, 42).to_raw();
    c.bench_function("expand", |b| {
        b.iter(|| black_box(DistributedId::from_raw(black_box(raw)).unwrap()));
    });
}

criterion_group!(benches, bench_fixed_time, bench_system_clock, bench_expand);
criterion_main!(benches);
