//! 定义了调度器的可配置参数。
//! Defines configurable parameters for the scheduler.

use std::time::Duration;

/// The fixed period between two ticks. Timer delays and intervals count ticks.
/// 两个节拍之间的固定周期。定时器的延迟和间隔以节拍计数。
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A structure containing all configurable parameters for a scheduler.
///
/// 包含调度器所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Tick source parameters.
    /// 节拍源参数。
    pub tick: TickConfig,

    /// Dispatch policy parameters.
    /// 分发策略参数。
    pub dispatch: DispatchConfig,
}

/// Which driver produces ticks for a scheduler.
///
/// 由哪个驱动为调度器产生节拍。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickSourceKind {
    /// A dedicated thread that ticks, then sleeps for one period.
    /// 一个专用线程，产生节拍后休眠一个周期。
    #[default]
    Thread,
    /// The process interval timer (`ITIMER_REAL`), observed through `SIGALRM`.
    /// Needs a running tokio runtime and is limited to one scheduler per process.
    ///
    /// 进程间隔定时器（`ITIMER_REAL`），通过 `SIGALRM` 观察。
    /// 需要正在运行的 tokio 运行时，并且每个进程只允许一个调度器使用。
    Signal,
    /// No driver. The owner calls `Scheduler::tick_now` itself.
    /// 无驱动。由所有者自行调用 `Scheduler::tick_now`。
    Manual,
}

/// Tick source parameters.
///
/// 节拍源参数。
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// The tick source to install at `init`.
    /// 在 `init` 时安装的节拍源。
    pub source: TickSourceKind,
    /// Name given to the dedicated tick thread.
    /// 专用节拍线程的名称。
    pub thread_name: String,
}

/// How a fired timer's callback is run.
///
/// 已触发定时器的回调如何执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// The callback runs on the tick path and its status decides whether the timer stays.
    /// 回调在节拍路径上执行，其返回状态决定定时器是否保留。
    #[default]
    Inline,
    /// The callback is submitted to a worker pool. Removal is explicit only.
    /// 回调被提交到工作线程池。只能显式移除。
    Offload,
}

/// Dispatch policy parameters.
///
/// 分发策略参数。
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// The dispatch policy, fixed for the scheduler's lifetime.
    /// 分发策略，在调度器生命周期内固定不变。
    pub policy: DispatchPolicy,
    /// Worker count for the offload pool. `0` uses the available parallelism.
    /// 卸载线程池的工作线程数。`0` 表示使用可用的并行度。
    pub pool_size_hint: usize,
    /// Prefix of worker thread names; workers are suffixed with their index.
    /// 工作线程名称前缀；每个工作线程名后附加其序号。
    pub worker_name_prefix: String,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            source: TickSourceKind::default(),
            thread_name: "timer-tick".to_string(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            pool_size_hint: 0,
            worker_name_prefix: "timer-worker".to_string(),
        }
    }
}

impl Config {
    /// Selects the tick source.
    /// 选择节拍源。
    pub fn with_tick_source(mut self, source: TickSourceKind) -> Self {
        self.tick.source = source;
        self
    }

    /// Selects the dispatch policy.
    /// 选择分发策略。
    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch.policy = policy;
        self
    }

    /// Sets the offload pool's worker count hint.
    /// 设置卸载线程池的工作线程数提示。
    pub fn with_pool_size(mut self, size_hint: usize) -> Self {
        self.dispatch.pool_size_hint = size_hint;
        self
    }
}
