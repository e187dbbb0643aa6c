//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use crate::config::DispatchPolicy;
use thiserror::Error;

/// The primary error type for the tick scheduler library.
/// 节拍调度器库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// A timer was requested with an interval that is not a positive number of seconds.
    /// 请求的定时器间隔不是正的秒数。
    #[error("timer interval must be positive, got {0}")]
    InvalidInterval(i64),

    /// The callback variant does not match the dispatch policy the scheduler was built with.
    /// 回调变体与调度器构建时选择的分发策略不匹配。
    #[error("callback does not match the scheduler's {policy:?} dispatch policy")]
    PolicyMismatch { policy: DispatchPolicy },

    /// The registry could not grow to hold another entry.
    /// 注册表无法扩容以容纳新的条目。
    #[error("timer registry storage exhausted")]
    Exhausted,

    /// The worker pool for offloaded dispatch could not be constructed.
    /// 无法构建用于卸载分发的工作线程池。
    #[error("failed to construct worker pool: {0}")]
    PoolInit(#[source] std::io::Error),

    /// The tick source could not be installed.
    /// 无法安装节拍源。
    #[error("failed to install tick source: {0}")]
    DriverInstall(#[source] std::io::Error),

    /// Another scheduler in this process already owns the alarm signal.
    /// 进程中的另一个调度器已经占用了闹钟信号。
    #[error("the process alarm timer is already claimed by another scheduler")]
    AlarmInUse,

    /// The signal tick source needs a tokio runtime and none is running.
    /// 信号节拍源需要 tokio 运行时，但当前没有运行时。
    #[error("signal tick source requires a running tokio runtime")]
    NoRuntime,

    /// A manual tick was requested on a scheduler that has its own tick source.
    /// 在拥有自身节拍源的调度器上请求了手动节拍。
    #[error("scheduler is driven by its own tick source")]
    ExternallyDriven,

    /// The scheduler has been shut down.
    /// 调度器已关闭。
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::PoolInit(e) | Error::DriverInstall(e) => e,
            Error::InvalidInterval(_) | Error::PolicyMismatch { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err)
            }
            Error::Exhausted => ErrorKind::OutOfMemory.into(),
            Error::AlarmInUse => ErrorKind::AddrInUse.into(),
            Error::NoRuntime | Error::ExternallyDriven => {
                std::io::Error::new(ErrorKind::Unsupported, err)
            }
            Error::ShutDown => ErrorKind::BrokenPipe.into(),
        }
    }
}
