//! 节拍动作与受锁保护的定时器表
//! Tick action and the lock-protected timer table
//!
//! 定时器表由一把互斥锁保护，节拍扫描、添加和删除都在持锁期间完成。
//! 节拍源只看到 [`SharedTimers::tick`]。
//!
//! The timer table sits behind a single mutex held for a full tick scan, an
//! add, and a delete. Tick sources only ever see [`SharedTimers::tick`].

use super::dispatch::{Dispatcher, Fired};
use super::entry::{TimerCallback, TimerEntry};
use super::registry::{LinkedRegistry, Visit};
use super::stats::TimerCounters;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// 一次节拍的处理结果
/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 扫描到的条目数
    /// Entries scanned
    pub visited: usize,
    /// 本节拍触发的条目数
    /// Entries that fired this tick
    pub fired: usize,
    /// 因回调要求而移除的条目数
    /// Entries removed at their callback's request
    pub removed: usize,
}

pub(crate) struct TimerTable<A> {
    entries: LinkedRegistry<TimerEntry<A>>,
    dispatcher: Dispatcher,
    counters: TimerCounters,
    closed: bool,
}

/// 调度器与节拍源共享的定时器状态
/// Timer state shared between the scheduler and its tick source
pub(crate) struct SharedTimers<A> {
    table: Mutex<TimerTable<A>>,
}

impl<A> SharedTimers<A>
where
    A: Send + Sync + 'static,
{
    pub(crate) fn new(dispatcher: Dispatcher) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(TimerTable {
                entries: LinkedRegistry::new(),
                dispatcher,
                counters: TimerCounters::default(),
                closed: false,
            }),
        })
    }

    /// 执行一次节拍：未到期的条目倒计时，到期的条目交给分发器
    /// Run one tick: count down entries that are not due, dispatch the ones that are
    pub(crate) fn tick(&self) -> TickReport {
        let mut guard = self.table.lock();
        let table = &mut *guard;
        let mut report = TickReport::default();

        if table.closed {
            return report;
        }

        let dispatcher = &table.dispatcher;
        table.entries.for_each_safe(|entry| {
            report.visited += 1;
            if !entry.countdown() {
                return Visit::Keep;
            }

            report.fired += 1;
            match dispatcher.fire(entry) {
                Fired::Rearm => {
                    entry.rearm();
                    Visit::Keep
                }
                Fired::Remove => {
                    report.removed += 1;
                    Visit::Unlink
                }
            }
        });

        table.counters.ticks += 1;
        table.counters.fired += report.fired as u64;
        table.counters.self_deleted += report.removed as u64;

        if report.fired > 0 {
            trace!(
                visited = report.visited,
                fired = report.fired,
                removed = report.removed,
                "Tick processed"
            );
        }
        report
    }

    pub(crate) fn insert(&self, entry: TimerEntry<A>) -> Result<()> {
        let mut table = self.table.lock();
        if table.closed {
            return Err(Error::ShutDown);
        }
        // Scheduler::add rejects mismatched callbacks before building the entry
        debug_assert_eq!(entry.callback().policy(), table.dispatcher.policy());

        let (delay, interval) = (entry.remaining(), entry.interval());
        table
            .entries
            .try_insert_tail(entry)
            .map_err(|_| Error::Exhausted)?;
        table.counters.added += 1;

        debug!(delay, interval, active = table.entries.len(), "Timer added");
        Ok(())
    }

    /// 移除第一个身份匹配的条目，返回是否找到
    /// Remove the first entry whose identity matches; returns whether one was found
    pub(crate) fn remove_first(&self, argument: &Arc<A>, callback: &TimerCallback<A>) -> bool {
        let mut table = self.table.lock();
        let Some(id) = table
            .entries
            .find_first(|entry| entry.matches(argument, callback))
        else {
            return false;
        };

        // 析构回调在锁内、摘除之后执行
        drop(table.entries.unlink(id));
        table.counters.deleted += 1;
        debug!(active = table.entries.len(), "Timer deleted");
        true
    }

    pub(crate) fn contains(&self, argument: &Arc<A>, callback: &TimerCallback<A>) -> bool {
        let table = self.table.lock();
        table
            .entries
            .find_first(|entry| entry.matches(argument, callback))
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub(crate) fn counters(&self) -> (TimerCounters, usize, usize) {
        let table = self.table.lock();
        (
            table.counters,
            table.entries.len(),
            table.dispatcher.pending_jobs(),
        )
    }

    /// 关闭定时器表，交出剩余条目和分发器。之后的节拍都是空操作。
    /// Close the table and hand back the remaining entries and the dispatcher.
    /// Every later tick is a no-op.
    pub(crate) fn close(&self) -> (Vec<TimerEntry<A>>, Dispatcher) {
        let mut table = self.table.lock();
        table.closed = true;
        let entries = table.entries.drain();
        let dispatcher = std::mem::replace(&mut table.dispatcher, Dispatcher::Inline);
        (entries, dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::entry::TickStatus;

    fn inline_entry(delay: u64, interval: u64) -> (TimerEntry<()>, Arc<()>, TimerCallback<()>) {
        let argument = Arc::new(());
        let callback = TimerCallback::inline(|_: &()| TickStatus::Continue);
        let entry = TimerEntry::new(delay, interval, argument.clone(), callback.clone(), None);
        (entry, argument, callback)
    }

    #[test]
    fn test_tick_counts_down_then_fires() {
        let timers = SharedTimers::new(Dispatcher::Inline);
        let (entry, _, _) = inline_entry(2, 2);
        timers.insert(entry).unwrap();

        let fired: Vec<usize> = (0..6).map(|_| timers.tick().fired).collect();
        // 第一次在第 3 个节拍触发（延迟 2），之后每 2 个节拍一次
        assert_eq!(fired, vec![0, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_closed_table_ignores_ticks_and_inserts() {
        let timers = SharedTimers::new(Dispatcher::Inline);
        let (entry, argument, callback) = inline_entry(0, 1);
        timers.insert(entry).unwrap();

        let (remaining, _dispatcher) = timers.close();
        assert_eq!(remaining.len(), 1);
        assert_eq!(timers.tick(), TickReport::default());

        let (late, _, _) = inline_entry(0, 1);
        assert!(matches!(timers.insert(late), Err(Error::ShutDown)));
        assert!(!timers.remove_first(&argument, &callback));
    }
}
