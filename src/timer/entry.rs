//! 定时器条目与回调定义
//! Timer entry and callback definitions

use crate::config::DispatchPolicy;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

/// 同步回调的返回状态
/// Status returned by an inline callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// 保留定时器，下一个间隔后再次触发
    /// Keep the timer; it fires again after one interval
    Continue,
    /// 移除定时器，其析构回调随即执行
    /// Remove the timer; its finalizer runs right away
    Stop,
}

impl<E> From<Result<(), E>> for TickStatus {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => TickStatus::Continue,
            Err(_) => TickStatus::Stop,
        }
    }
}

/// 在节拍路径上同步执行的回调
/// Callback that runs synchronously on the tick path
pub type InlineFn<A> = dyn Fn(&A) -> TickStatus + Send + Sync;

/// 提交给工作线程池执行的回调
/// Callback submitted to the worker pool
pub type OffloadFn<A> = dyn Fn(&A) + Send + Sync;

/// 条目被移除时执行一次的清理回调
/// Cleanup run once when an entry is removed
pub type Finalizer<A> = Box<dyn FnOnce(&A) + Send>;

/// 定时器回调。克隆保留身份；对同一个闭包包装两次会得到两个不同的身份。
///
/// Timer callback. Clones share identity; wrapping the same closure twice
/// yields two distinct identities.
pub enum TimerCallback<A> {
    /// 同步执行，返回状态决定是否自我删除
    /// Runs inline; the returned status decides self-deletion
    Inline(Arc<InlineFn<A>>),
    /// 卸载到工作线程池，不返回结果
    /// Offloaded to the worker pool, no result
    Offload(Arc<OffloadFn<A>>),
}

impl<A> TimerCallback<A> {
    /// 用闭包创建同步回调
    /// Create an inline callback from a closure
    pub fn inline<F>(callback: F) -> Self
    where
        F: Fn(&A) -> TickStatus + Send + Sync + 'static,
    {
        TimerCallback::Inline(Arc::new(callback))
    }

    /// 用闭包创建卸载回调
    /// Create an offloaded callback from a closure
    pub fn offload<F>(callback: F) -> Self
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        TimerCallback::Offload(Arc::new(callback))
    }

    /// 该回调所需的分发策略
    /// The dispatch policy this callback requires
    pub fn policy(&self) -> DispatchPolicy {
        match self {
            TimerCallback::Inline(_) => DispatchPolicy::Inline,
            TimerCallback::Offload(_) => DispatchPolicy::Offload,
        }
    }

    /// 按身份比较，而不是按值比较
    /// Compare by identity, not by value
    pub fn same_as(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    fn identity(&self) -> *const () {
        match self {
            TimerCallback::Inline(callback) => Arc::as_ptr(callback) as *const (),
            TimerCallback::Offload(callback) => Arc::as_ptr(callback) as *const (),
        }
    }
}

impl<A> Clone for TimerCallback<A> {
    fn clone(&self) -> Self {
        match self {
            TimerCallback::Inline(callback) => TimerCallback::Inline(Arc::clone(callback)),
            TimerCallback::Offload(callback) => TimerCallback::Offload(Arc::clone(callback)),
        }
    }
}

impl<A> fmt::Debug for TimerCallback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(match self {
            TimerCallback::Inline(_) => "Inline",
            TimerCallback::Offload(_) => "Offload",
        })
        .field(&self.identity())
        .finish()
    }
}

/// 注册表中的定时器条目
/// Timer entry held by the registry
pub struct TimerEntry<A> {
    /// 两次触发之间的节拍数，始终大于零
    /// Ticks between firings, always positive
    interval: u64,
    /// 距离下一次触发的节拍数
    /// Ticks until the next firing
    remaining: u64,
    callback: TimerCallback<A>,
    argument: Arc<A>,
    finalizer: Option<Finalizer<A>>,
}

impl<A> TimerEntry<A> {
    /// 创建条目。`interval` 必须大于零，由调用方校验。
    /// Create an entry. `interval` must be positive; the caller validates it.
    pub(crate) fn new(
        delay: u64,
        interval: u64,
        argument: Arc<A>,
        callback: TimerCallback<A>,
        finalizer: Option<Finalizer<A>>,
    ) -> Self {
        debug_assert!(interval > 0);
        Self {
            interval,
            remaining: delay,
            callback,
            argument,
            finalizer,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn callback(&self) -> &TimerCallback<A> {
        &self.callback
    }

    pub fn argument(&self) -> &Arc<A> {
        &self.argument
    }

    /// 本节拍是否到期。未到期时倒计时减一。
    /// Whether the entry is due this tick. Counts down by one when it is not.
    pub(crate) fn countdown(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            false
        } else {
            true
        }
    }

    /// 触发后重新装填，使下一次触发恰好在一个间隔之后
    /// Re-arm after firing so the next firing is exactly one interval later
    pub(crate) fn rearm(&mut self) {
        self.remaining = self.interval - 1;
    }

    /// 身份匹配：同一个回调与同一个参数
    /// Identity match: same callback and same argument
    pub fn matches(&self, argument: &Arc<A>, callback: &TimerCallback<A>) -> bool {
        Arc::ptr_eq(&self.argument, argument) && self.callback.same_as(callback)
    }
}

impl<A> Drop for TimerEntry<A> {
    /// 析构回调可能在节拍扫描中执行，其 panic 在这里截获，不会传播到节拍源。
    /// The finalizer may run inside a tick scan; a panic is contained here and
    /// never reaches the tick source.
    fn drop(&mut self) {
        if let Some(finalizer) = self.finalizer.take() {
            let argument = &self.argument;
            if catch_unwind(AssertUnwindSafe(|| finalizer(argument))).is_err() {
                warn!("Timer finalizer panicked");
            }
        }
    }
}

impl<A> fmt::Debug for TimerEntry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEntry")
            .field("interval", &self.interval)
            .field("remaining", &self.remaining)
            .field("callback", &self.callback)
            .field("finalizer", &self.finalizer.is_some())
            .finish()
    }
}
