//! 专用线程节拍源集成测试
//! Dedicated thread tick source integration tests

mod common;

use common::harness::{Probe, counting, finalizer, init_tracing};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tick_scheduler::timer::Finalizer;
use tick_scheduler::{Config, Scheduler, TickSourceKind, TickStatus, TimerCallback};

#[test]
fn test_thread_driver_fires_every_second() {
    init_tracing();
    let scheduler: Scheduler<Probe> = Scheduler::init(Config::default()).unwrap();
    assert_eq!(scheduler.tick_source(), TickSourceKind::Thread);

    let probe = Arc::new(Probe::default());
    scheduler
        .add(0, 1, probe.clone(), counting(), finalizer())
        .unwrap();

    thread::sleep(Duration::from_millis(2500));
    let hits = probe.hits();
    assert!((2..=4).contains(&hits), "expected 2..=4 firings, got {hits}");

    scheduler.shutdown();
    assert_eq!(probe.finalized(), 1);

    // 关闭之后节拍源不再触发
    let after = probe.hits();
    thread::sleep(Duration::from_millis(1200));
    assert_eq!(probe.hits(), after);
}

#[test]
fn test_thread_driver_self_deletion() {
    init_tracing();
    let scheduler: Scheduler<Probe> = Scheduler::init(Config::default()).unwrap();
    let probe = Arc::new(Probe::default());
    let once = TimerCallback::inline(|probe: &Probe| {
        probe.hits.fetch_add(1, Ordering::SeqCst);
        TickStatus::Stop
    });
    scheduler
        .add(0, 1, probe.clone(), once.clone(), finalizer())
        .unwrap();

    thread::sleep(Duration::from_millis(1600));
    assert_eq!(probe.hits(), 1);
    assert_eq!(probe.finalized(), 1);
    assert!(!scheduler.contains(&probe, &once));
    scheduler.shutdown();
}

#[test]
fn test_panicking_finalizer_does_not_stop_driver() {
    init_tracing();
    let scheduler: Scheduler<Probe> = Scheduler::init(Config::default()).unwrap();
    let healthy = Arc::new(Probe::default());
    let doomed = Arc::new(Probe::default());
    let bad_finalizer: Finalizer<Probe> = Box::new(|_: &Probe| panic!("finalizer bug"));

    scheduler
        .add(0, 1, healthy.clone(), counting(), finalizer())
        .unwrap();
    scheduler
        .add(
            0,
            1,
            doomed.clone(),
            TimerCallback::inline(|_: &Probe| TickStatus::Stop),
            Some(bad_finalizer),
        )
        .unwrap();

    thread::sleep(Duration::from_millis(3500));
    let hits = healthy.hits();
    assert!(hits >= 3, "expected at least 3 firings, got {hits}");
    assert_eq!(scheduler.len(), 1);

    scheduler.shutdown();
    assert_eq!(healthy.finalized(), 1);
}

#[test]
fn test_concurrent_add_and_delete_while_ticking() {
    init_tracing();
    let scheduler: Arc<Scheduler<Probe>> = Arc::new(Scheduler::init(Config::default()).unwrap());
    let callback = counting();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            let callback = callback.clone();
            thread::spawn(move || {
                let probes: Vec<_> = (0..50).map(|_| Arc::new(Probe::default())).collect();
                for probe in &probes {
                    scheduler
                        .add(0, 1, probe.clone(), callback.clone(), finalizer())
                        .unwrap();
                }
                thread::sleep(Duration::from_millis(300));
                for probe in &probes {
                    scheduler.delete(probe, &callback);
                }
                probes
            })
        })
        .collect();

    let mut finalized = 0;
    for worker in workers {
        for probe in worker.join().unwrap() {
            finalized += probe.finalized();
        }
    }

    assert_eq!(finalized, 200);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.stats().deleted, 200);
}
