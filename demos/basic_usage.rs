//! Basic worker pool usage example
//!
//! Demonstrates pool creation, prioritized submission, retries, deadlines,
//! resizing and statistics.
//!
//! Run with: cargo run --example basic_usage

use rust_worker_pool::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Rust Worker Pool - Basic Usage Example ===\n");

    let pool = WorkerPool::new(4)?;
    println!("1. Started worker pool with {} workers", pool.worker_count());

    println!("\n2. Submitting prioritized jobs:");
    for (i, priority) in [Priority::Low, Priority::High, Priority::Normal]
        .into_iter()
        .enumerate()
    {
        pool.execute_with_priority(priority, move |_| {
            println!(
                "  Job {} ({}) executing on {:?}",
                i,
                priority,
                thread::current().name().unwrap_or("unnamed")
            );
            thread::sleep(Duration::from_millis(20));
            Ok(())
        })?;
    }

    println!("\n3. Submitting a flaky job with 3 retries:");
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    pool.submit(
        Job::new(move |_| {
            let call = calls_clone.fetch_add(1, Ordering::SeqCst) + 1;
            if call < 3 {
                Err(PoolError::task(format!("flaky failure #{}", call)))
            } else {
                println!("  Flaky job succeeded on attempt {}", call);
                Ok(())
            }
        })
        .with_name("flaky")
        .with_retry(3)
        .with_retry_delay(Duration::from_millis(10))
        .with_backoff(Backoff::Exponential {
            factor: 2.0,
            max_delay: Duration::from_millis(100),
        }),
    )?;

    println!("\n4. Submitting a job that outlives its 20ms deadline:");
    pool.submit(
        Job::new(|ctx| {
            ctx.sleep(Duration::from_millis(500))?;
            println!("  This line is never printed");
            Ok(())
        })
        .with_name("slow-report")
        .with_timeout(Duration::from_millis(20)),
    )?;

    thread::sleep(Duration::from_millis(200));

    println!("\n5. Scaling to 2 workers");
    pool.scale_to(2)?;
    thread::sleep(Duration::from_millis(20));
    println!(
        "   Intended workers: {}, live workers: {}",
        pool.worker_count(),
        pool.live_workers()
    );

    println!("\n6. Shutting down worker pool...");
    pool.stop()?;

    let stats = pool.stats().snapshot();
    println!("\n7. Final statistics:");
    println!("   Submitted: {}", stats.submitted);
    println!("   Succeeded: {}", stats.succeeded);
    println!("   Failed attempts: {}", stats.failed_attempts);
    println!("   Deadline exceeded: {}", stats.deadline_exceeded);
    println!("   Permanent failures: {}", stats.permanent_failures);
    for worker in &stats.workers {
        println!(
            "   Worker {}: {} jobs, {} attempts",
            worker.worker_id, worker.jobs_taken, worker.attempts
        );
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
