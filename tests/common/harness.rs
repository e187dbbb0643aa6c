//! tests/common/harness.rs
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use tick_scheduler::timer::Finalizer;
use tick_scheduler::{TickStatus, TimerCallback};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tick_scheduler=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Argument type shared by the integration tests.
#[derive(Default)]
pub struct Probe {
    pub hits: AtomicUsize,
    pub finalized: AtomicUsize,
}

#[allow(dead_code)]
impl Probe {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
pub fn counting() -> TimerCallback<Probe> {
    TimerCallback::inline(|probe: &Probe| {
        probe.hits.fetch_add(1, Ordering::SeqCst);
        TickStatus::Continue
    })
}

#[allow(dead_code)]
pub fn finalizer() -> Option<Finalizer<Probe>> {
    Some(Box::new(|probe: &Probe| {
        probe.finalized.fetch_add(1, Ordering::SeqCst);
    }))
}
