//! 卸载分发集成测试
//! Offloaded dispatch integration tests

mod common;

use common::harness::{Probe, finalizer, init_tracing};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tick_scheduler::{Config, DispatchPolicy, Scheduler, TimerCallback};

#[test]
fn test_slow_offloaded_callback_does_not_delay_ticks() {
    init_tracing();
    let config = Config::default()
        .with_dispatch_policy(DispatchPolicy::Offload)
        .with_pool_size(4);
    let scheduler: Scheduler<Probe> = Scheduler::init(config).unwrap();

    let probe = Arc::new(Probe::default());
    let slow = TimerCallback::offload(|probe: &Probe| {
        probe.hits.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1500));
    });
    scheduler
        .add(0, 1, probe.clone(), slow.clone(), finalizer())
        .unwrap();

    // 每次执行 1.5 秒，但提交不等待上一次完成
    thread::sleep(Duration::from_millis(3500));
    let started = probe.hits();
    assert!(started >= 3, "expected at least 3 overlapping runs, got {started}");

    scheduler.delete(&probe, &slow);
    assert_eq!(probe.finalized(), 1);
    assert!(scheduler.is_empty());

    // 删除之后不再有新的提交；关闭会等待已提交的任务
    scheduler.shutdown();
    let settled = probe.hits();
    thread::sleep(Duration::from_millis(1200));
    assert_eq!(probe.hits(), settled);
    assert!(settled <= started + 1);
}
