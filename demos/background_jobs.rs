//! Background jobs from several producers sharing one pool
//!
//! A request handler hands off mail delivery, a ticker enqueues periodic
//! cleanup, and everything drains on shutdown. The mailer and the "HTTP"
//! side are stand-ins; the pool only sees closures.
//!
//! Run with: cargo run --example background_jobs

use rust_worker_pool::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pretend mail transport that drops every third message
struct Mailer {
    sent: AtomicUsize,
    attempts: AtomicUsize,
}

impl Mailer {
    fn send(&self, to: &str, subject: &str) -> Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) % 3 == 2 {
            return Err(PoolError::task(format!("smtp timeout sending to {}", to)));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        println!("  mail to {}: {}", to, subject);
        Ok(())
    }
}

/// Request handler: does its own work inline, defers the mail
fn handle_signup(pool: &WorkerPool, mailer: &Arc<Mailer>, email: &str) -> Result<()> {
    let mailer = Arc::clone(mailer);
    let to = email.to_string();
    pool.submit(
        Job::new(move |_| mailer.send(&to, "Your sign-in link"))
            .with_name(format!("magic-link:{}", email))
            .with_priority(Priority::High)
            .with_retry(3)
            .with_retry_delay(Duration::from_millis(25))
            .with_timeout(Duration::from_secs(2)),
    )?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WorkerPoolConfig::new(3)
        .with_thread_name_prefix("background")
        .with_shutdown_mode(ShutdownMode::Drain);
    let pool = Arc::new(WorkerPool::with_config(config)?);
    let mailer = Arc::new(Mailer {
        sent: AtomicUsize::new(0),
        attempts: AtomicUsize::new(0),
    });

    // Scheduler: enqueue a low-priority cleanup every 40ms
    let ticking = Arc::new(AtomicBool::new(true));
    let scheduler = {
        let pool = Arc::clone(&pool);
        let ticking = Arc::clone(&ticking);
        thread::spawn(move || {
            let mut tick = 0;
            while ticking.load(Ordering::SeqCst) {
                tick += 1;
                let result = pool.submit(
                    Job::new(move |ctx| {
                        ctx.sleep(Duration::from_millis(5))?;
                        println!("  cleanup pass #{} done", tick);
                        Ok(())
                    })
                    .with_name("expired-sessions-cleanup")
                    .with_priority(Priority::Low),
                );
                if let Err(e) = result {
                    println!("  scheduler stopping: {}", e);
                    break;
                }
                thread::sleep(Duration::from_millis(40));
            }
        })
    };

    for email in ["ada@example.com", "grace@example.com", "linus@example.com"] {
        handle_signup(&pool, &mailer, email)?;
        thread::sleep(Duration::from_millis(30));
    }

    // Traffic spike: add capacity, then return to normal
    pool.scale_to(6)?;
    for i in 0..6 {
        handle_signup(&pool, &mailer, &format!("user{}@example.com", i))?;
    }
    thread::sleep(Duration::from_millis(100));
    pool.scale_to(3)?;

    ticking.store(false, Ordering::SeqCst);
    if scheduler.join().is_err() {
        eprintln!("scheduler thread panicked");
    }

    pool.stop()?;

    let stats = pool.stats().snapshot();
    println!(
        "\nmails sent: {}, retries: {}, permanent failures: {}",
        mailer.sent.load(Ordering::SeqCst),
        stats.retries,
        stats.permanent_failures
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).unwrap_or_else(|e| e.to_string())
    );

    Ok(())
}
