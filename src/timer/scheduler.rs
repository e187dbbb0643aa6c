//! 调度器门面
//! Scheduler facade
//!
//! 调度器是一个显式构建的上下文对象：`init` 建立定时器表、分发器和节拍源，
//! `shutdown` 按相反顺序拆除它们。多个调度器实例彼此独立（信号节拍源除外，
//! 它在进程内只能有一个）。
//!
//! The scheduler is an explicitly constructed context object: `init` builds the
//! timer table, the dispatcher and the tick source, and `shutdown` tears them
//! down in reverse. Scheduler instances are independent of each other, except
//! that the signal tick source can only be held by one of them per process.

use super::dispatch::Dispatcher;
use super::entry::{Finalizer, TimerCallback, TimerEntry};
use super::pool::WorkerPool;
use super::source::{TickAction, TickSource};
use super::stats::SchedulerStats;
use super::tick::{SharedTimers, TickReport};
use crate::config::{Config, DispatchPolicy, TickSourceKind};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// 周期性定时器调度器
/// Periodic timer scheduler
///
/// `A` 是回调和析构回调接收的参数类型。参数由调用方以 `Arc<A>` 持有，
/// 调度器只保存其引用，并以指针身份识别。
///
/// `A` is the argument type passed to callbacks and finalizers. The caller owns
/// the argument as an `Arc<A>`; the scheduler only keeps a reference and
/// identifies it by pointer.
pub struct Scheduler<A: Send + Sync + 'static> {
    timers: Arc<SharedTimers<A>>,
    source: TickSource,
    policy: DispatchPolicy,
    stopped: bool,
}

impl<A: Send + Sync + 'static> Scheduler<A> {
    /// 初始化调度器。卸载策略下先构建工作线程池，再安装节拍源；
    /// 节拍源安装失败时线程池会被回收，不留下任何部分状态。
    ///
    /// Initialize a scheduler. With the offload policy the worker pool is built
    /// before the tick source is installed; if the tick source fails to install,
    /// the pool is torn down and nothing partial is left behind.
    pub fn init(config: Config) -> Result<Self> {
        let policy = config.dispatch.policy;
        let dispatcher = match policy {
            DispatchPolicy::Inline => Dispatcher::Inline,
            DispatchPolicy::Offload => Dispatcher::Offload(WorkerPool::new(
                config.dispatch.pool_size_hint,
                &config.dispatch.worker_name_prefix,
            )?),
        };

        let timers = SharedTimers::new(dispatcher);
        let action: TickAction = {
            let timers = Arc::clone(&timers);
            Arc::new(move || {
                timers.tick();
            })
        };

        let source = match TickSource::install(&config.tick, action) {
            Ok(source) => source,
            Err(err) => {
                let (_, mut dispatcher) = timers.close();
                dispatcher.shutdown();
                return Err(err);
            }
        };

        info!(?policy, source = ?source.kind(), "Scheduler initialized");
        Ok(Self {
            timers,
            source,
            policy,
            stopped: false,
        })
    }

    /// 添加定时器：首次在 `delay` 个节拍后触发，之后每 `interval` 个节拍触发一次。
    ///
    /// `interval` 必须为正，负的 `delay` 视为 0。回调的变体必须与调度器的分发策略一致。
    /// 失败时不产生任何副作用。
    ///
    /// Add a timer that first fires after `delay` ticks and then every `interval`
    /// ticks. `interval` must be positive; a negative `delay` counts as 0. The
    /// callback variant must match the scheduler's dispatch policy. Nothing is
    /// changed on failure.
    pub fn add(
        &self,
        delay: i64,
        interval: i64,
        argument: Arc<A>,
        callback: TimerCallback<A>,
        finalizer: Option<Finalizer<A>>,
    ) -> Result<()> {
        if interval <= 0 {
            return Err(Error::InvalidInterval(interval));
        }
        if callback.policy() != self.policy {
            return Err(Error::PolicyMismatch {
                policy: self.policy,
            });
        }

        let delay = delay.max(0) as u64;
        let entry = TimerEntry::new(delay, interval as u64, argument, callback, finalizer);
        self.timers.insert(entry)
    }

    /// 删除第一个 `(callback, argument)` 身份匹配的定时器，并执行其析构回调。
    /// 没有匹配时为空操作。存在多个相同身份时只删除最早添加的那个。
    ///
    /// Delete the first timer whose `(callback, argument)` identity matches and
    /// run its finalizer. No-op when nothing matches. With duplicate identities,
    /// only the earliest added one is removed.
    pub fn delete(&self, argument: &Arc<A>, callback: &TimerCallback<A>) {
        if !self.timers.remove_first(argument, callback) {
            debug!("Delete found no matching timer");
        }
    }

    /// 是否存在身份匹配的定时器
    /// Whether a timer with this identity is registered
    pub fn contains(&self, argument: &Arc<A>, callback: &TimerCallback<A>) -> bool {
        self.timers.contains(argument, callback)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn tick_source(&self) -> TickSourceKind {
        self.source.kind()
    }

    /// 手动执行一个节拍。只有手动节拍源的调度器可以调用。
    /// Run one tick by hand. Only available with the manual tick source.
    pub fn tick_now(&self) -> Result<TickReport> {
        match self.source.kind() {
            TickSourceKind::Manual => Ok(self.timers.tick()),
            _ => Err(Error::ExternallyDriven),
        }
    }

    /// 获取统计信息
    /// Get statistics
    pub fn stats(&self) -> SchedulerStats {
        let (counters, active_timers, pending_jobs) = self.timers.counters();
        SchedulerStats {
            policy: self.policy,
            source: self.source.kind(),
            active_timers,
            ticks: counters.ticks,
            added: counters.added,
            fired: counters.fired,
            self_deleted: counters.self_deleted,
            deleted: counters.deleted,
            pending_jobs,
        }
    }

    /// 关闭调度器：停止节拍源，回收工作线程池（已入队的任务会执行完），
    /// 然后摘除并析构所有剩余定时器。
    ///
    /// Shut the scheduler down: stop the tick source, tear down the worker pool
    /// (queued jobs still run), then unlink and finalize every remaining timer.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.source.stop();
        let (entries, mut dispatcher) = self.timers.close();
        dispatcher.shutdown();

        let finalized = entries.len();
        drop(entries);
        info!(finalized, "Scheduler shut down");
    }
}

impl<A: Send + Sync + 'static> Drop for Scheduler<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<A: Send + Sync + 'static> std::fmt::Debug for Scheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("policy", &self.policy)
            .field("source", &self.source.kind())
            .field("timers", &self.len())
            .finish()
    }
}
