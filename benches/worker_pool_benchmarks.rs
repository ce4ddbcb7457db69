use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rust_worker_pool::prelude::*;
use rust_worker_pool::{NoopObserver, QueueKind, QueuedJob};
use std::sync::Arc;

fn quiet_pool(config: WorkerPoolConfig) -> WorkerPool {
    WorkerPool::with_observer(config, Arc::new(NoopObserver)).expect("Failed to create pool")
}

fn benchmark_pool_creation(c: &mut Criterion) {
    c.bench_function("worker_pool_creation", |b| {
        b.iter(|| {
            let pool = quiet_pool(WorkerPoolConfig::new(4));
            pool.stop().expect("Failed to stop pool");
        });
    });
}

fn benchmark_job_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_submission");

    for kind in [QueueKind::Heap, QueueKind::Sorted] {
        group.bench_with_input(BenchmarkId::new("drain_100", kind), &kind, |b, &kind| {
            b.iter_batched(
                || {
                    quiet_pool(
                        WorkerPoolConfig::new(4)
                            .with_queue_kind(kind)
                            .with_shutdown_mode(ShutdownMode::Drain),
                    )
                },
                |pool| {
                    for i in 0..100 {
                        let priority = Priority::descending()[i % 3];
                        pool.execute_with_priority(priority, |_| {
                            black_box(1 + 1);
                            Ok(())
                        })
                        .expect("Failed to submit job");
                    }
                    pool.stop().expect("Failed to stop pool");
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_retrying_jobs(c: &mut Criterion) {
    c.bench_function("retrying_jobs_50x3", |b| {
        b.iter_batched(
            || quiet_pool(WorkerPoolConfig::new(4).with_shutdown_mode(ShutdownMode::Drain)),
            |pool| {
                for _ in 0..50 {
                    pool.submit(
                        Job::new(|_| Err(PoolError::task("always fails"))).with_retry(2),
                    )
                    .expect("Failed to submit job");
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_ready_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("ready_queue_push_pop");

    for size in [16usize, 256, 1024] {
        for kind in [QueueKind::Heap, QueueKind::Sorted] {
            group.bench_with_input(BenchmarkId::new(kind.to_string(), size), &size, |b, &size| {
                b.iter_batched(
                    || {
                        let mut queue = kind.build();
                        for seq in 0..size {
                            let priority = Priority::descending()[seq % 3];
                            queue.push(QueuedJob::new(
                                Job::new(|_| Ok(())).with_priority(priority),
                                seq as u64,
                            ));
                        }
                        queue
                    },
                    |mut queue| {
                        while let Some(job) = queue.pop() {
                            black_box(job.sequence());
                        }
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_pool_creation,
    benchmark_job_submission,
    benchmark_retrying_jobs,
    benchmark_ready_queue
);
criterion_main!(benches);
