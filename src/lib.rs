#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the periodic tick scheduler library.
//! 周期性节拍调度器库的根。

pub mod config;
pub mod error;

pub mod timer;

pub use config::{Config, DispatchPolicy, TickSourceKind};
pub use error::{Error, Result};
pub use timer::{Scheduler, TickStatus, TimerCallback};
