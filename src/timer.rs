//! 周期性定时器调度模块
//! Periodic Timer Scheduling Module
//!
//! 该模块实现一个以秒为节拍的周期性回调调度器。定时器保存在受单把锁保护的
//! 链接注册表中；节拍源每秒调用一次节拍动作，由分发策略决定到期回调是在
//! 节拍路径上同步执行，还是提交给工作线程池。
//!
//! This module implements a scheduler of periodic callbacks on a one-second tick.
//! Timers live in a linked registry behind a single lock; the tick source runs
//! the tick action once per second, and the dispatch policy decides whether a
//! due callback runs inline on the tick path or is handed to a worker pool.

pub mod entry;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod stats;

mod dispatch;
mod source;
mod tick;


pub use entry::{Finalizer, InlineFn, OffloadFn, TickStatus, TimerCallback, TimerEntry};
pub use pool::WorkerPool;
pub use registry::{LinkedRegistry, NodeId, Visit};
pub use scheduler::Scheduler;
pub use stats::SchedulerStats;
pub use tick::TickReport;
