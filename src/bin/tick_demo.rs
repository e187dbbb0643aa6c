//! 注册一个每秒和一个每三秒的定时器，运行若干秒后关闭。
//! Registers a one-second and a three-second timer, runs for a while, then shuts down.
//!
//! Usage: `tick_demo [seconds]` (default 10). Log level follows `RUST_LOG`.

use std::sync::Arc;
use std::time::Duration;
use tick_scheduler::{Config, Scheduler, TickStatus, TimerCallback};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let seconds: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 10,
    };

    let scheduler: Scheduler<&'static str> = Scheduler::init(Config::default())?;
    let announce = TimerCallback::inline(|label: &&'static str| {
        info!("{label}");
        TickStatus::Continue
    });

    scheduler.add(0, 1, Arc::new("every 1 s."), announce.clone(), None)?;
    scheduler.add(0, 3, Arc::new("every 3 s."), announce, None)?;

    std::thread::sleep(Duration::from_secs(seconds));

    info!(stats = %scheduler.stats(), "Demo finished");
    scheduler.shutdown();
    Ok(())
}
