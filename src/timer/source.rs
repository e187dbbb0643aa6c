//! 节拍源
//! Tick sources
//!
//! 每个调度器恰好拥有一个节拍源：专用线程、进程闹钟信号，或者由所有者
//! 手动驱动。节拍源只负责按周期调用节拍动作，从不并发调用。
//!
//! Every scheduler owns exactly one tick source: a dedicated thread, the
//! process alarm signal, or manual driving by the owner. A tick source only
//! invokes the tick action once per period and never concurrently.

mod signal;
mod thread;

use crate::config::{TICK_PERIOD, TickConfig, TickSourceKind};
use crate::error::Result;
use std::sync::Arc;

pub(crate) use signal::SignalDriver;
pub(crate) use thread::ThreadDriver;

/// 节拍源在每个节拍调用的动作
/// Action a tick source invokes on every tick
pub(crate) type TickAction = Arc<dyn Fn() + Send + Sync>;

/// 已安装的节拍源
/// An installed tick source
pub(crate) enum TickSource {
    Thread(ThreadDriver),
    Signal(SignalDriver),
    Manual,
}

impl TickSource {
    /// 按配置安装节拍源。失败时不会留下任何已安装的驱动。
    /// Install the configured tick source. Nothing stays installed on failure.
    pub(crate) fn install(config: &TickConfig, action: TickAction) -> Result<Self> {
        match config.source {
            TickSourceKind::Thread => Ok(TickSource::Thread(ThreadDriver::spawn(
                &config.thread_name,
                TICK_PERIOD,
                action,
            )?)),
            TickSourceKind::Signal => Ok(TickSource::Signal(SignalDriver::install(
                TICK_PERIOD,
                action,
            )?)),
            TickSourceKind::Manual => Ok(TickSource::Manual),
        }
    }

    pub(crate) fn kind(&self) -> TickSourceKind {
        match self {
            TickSource::Thread(_) => TickSourceKind::Thread,
            TickSource::Signal(_) => TickSourceKind::Signal,
            TickSource::Manual => TickSourceKind::Manual,
        }
    }

    /// 停止节拍源。线程节拍源会被等待退出；信号节拍源的任务被分离，
    /// 一个已经被选中的节拍仍可能开始，但它面对的是已关闭的定时器表。
    /// 因此 `Scheduler::shutdown` 返回后不会再有回调触发。
    ///
    /// Stop the tick source. The thread source is joined. The signal task is
    /// detached, so a tick it already picked may still start, but it finds the
    /// timer table closed. No callback fires after `Scheduler::shutdown` returns.
    pub(crate) fn stop(&mut self) {
        match self {
            TickSource::Thread(driver) => driver.stop(),
            TickSource::Signal(driver) => driver.stop(),
            TickSource::Manual => {}
        }
    }
}
