//! 已触发定时器的分发策略
//! Dispatch policy for fired timers
//!
//! 调度器在构建时选择一种策略并在整个生命周期内使用它：
//! - 同步：回调在持有注册表锁的节拍路径上执行，返回 `Stop` 即自我删除；
//! - 卸载：回调连同参数提交给工作线程池，调度器不关心其结果。
//!
//! A scheduler picks one policy at construction and keeps it for its lifetime:
//! - inline: the callback runs on the tick path under the registry lock, and
//!   returning `Stop` deletes the timer;
//! - offload: the callback and its argument are submitted to the worker pool
//!   and the outcome is never observed.
//!
//! 同步回调禁止在回调内部调用同一调度器的 `add` 或 `delete`，否则会死锁。
//! An inline callback must not call `add` or `delete` on its own scheduler; doing so deadlocks.

use super::entry::{TimerCallback, TimerEntry, TickStatus};
use super::pool::WorkerPool;
use crate::config::DispatchPolicy;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{trace, warn};

/// 触发后条目的去留
/// What happens to an entry after it fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fired {
    /// 重新装填并保留
    /// Re-arm and keep
    Rearm,
    /// 摘除并析构
    /// Unlink and finalize
    Remove,
}

/// 分发器，即带有运行时资源的分发策略
/// Dispatcher: a dispatch policy together with its runtime resources
pub(crate) enum Dispatcher {
    Inline,
    Offload(WorkerPool),
}

impl Dispatcher {
    pub(crate) fn policy(&self) -> DispatchPolicy {
        match self {
            Dispatcher::Inline => DispatchPolicy::Inline,
            Dispatcher::Offload(_) => DispatchPolicy::Offload,
        }
    }

    /// 执行一个到期条目的回调
    /// Run the callback of a due entry
    pub(crate) fn fire<A>(&self, entry: &TimerEntry<A>) -> Fired
    where
        A: Send + Sync + 'static,
    {
        match (self, entry.callback()) {
            (Dispatcher::Inline, TimerCallback::Inline(callback)) => {
                let argument = entry.argument();
                match catch_unwind(AssertUnwindSafe(|| callback(&**argument))) {
                    Ok(TickStatus::Continue) => Fired::Rearm,
                    Ok(TickStatus::Stop) => {
                        trace!("Inline callback asked for removal");
                        Fired::Remove
                    }
                    Err(_) => {
                        warn!("Inline timer callback panicked, removing timer");
                        Fired::Remove
                    }
                }
            }
            (Dispatcher::Offload(pool), TimerCallback::Offload(callback)) => {
                let callback = Arc::clone(callback);
                let argument = Arc::clone(entry.argument());
                pool.submit(Box::new(move || callback(&*argument)));
                Fired::Rearm
            }
            // add() never links a callback that does not match the policy
            _ => Fired::Remove,
        }
    }

    pub(crate) fn pending_jobs(&self) -> usize {
        match self {
            Dispatcher::Inline => 0,
            Dispatcher::Offload(pool) => pool.pending_jobs(),
        }
    }

    pub(crate) fn shutdown(&mut self) {
        if let Dispatcher::Offload(pool) = self {
            pool.shutdown();
        }
    }
}
