//! 调度器统计信息
//! Scheduler statistics

use crate::config::{DispatchPolicy, TickSourceKind};

/// 定时器表内部维护的累计计数
/// Running counters kept by the timer table
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TimerCounters {
    pub ticks: u64,
    pub added: u64,
    pub fired: u64,
    pub self_deleted: u64,
    pub deleted: u64,
}

/// 调度器统计信息快照
/// Scheduler statistics snapshot
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    /// 分发策略
    /// Dispatch policy
    pub policy: DispatchPolicy,
    /// 节拍源
    /// Tick source
    pub source: TickSourceKind,
    /// 当前注册的定时器数
    /// Timers currently registered
    pub active_timers: usize,
    /// 已处理的节拍数
    /// Ticks processed
    pub ticks: u64,
    /// 累计添加的定时器数
    /// Timers added so far
    pub added: u64,
    /// 累计触发次数
    /// Firings so far
    pub fired: u64,
    /// 因回调要求而移除的定时器数
    /// Timers removed at their callback's request
    pub self_deleted: u64,
    /// 被显式删除的定时器数
    /// Timers removed by an explicit delete
    pub deleted: u64,
    /// 已提交但尚未开始执行的卸载任务数。队列无界，这里只做观察，不做限流。
    /// Offloaded jobs submitted but not started. The queue is unbounded; this is observed, not throttled.
    pub pending_jobs: usize,
}

impl std::fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SchedulerStats {{ policy: {:?}, source: {:?}, timers: {}, ticks: {}, added: {}, fired: {}, self_deleted: {}, deleted: {}, pending_jobs: {} }}",
            self.policy,
            self.source,
            self.active_timers,
            self.ticks,
            self.added,
            self.fired,
            self.self_deleted,
            self.deleted,
            self.pending_jobs
        )
    }
}
