//! 进程闹钟信号节拍源
//! Process alarm signal tick source
//!
//! 通过 `setitimer(ITIMER_REAL)` 让内核每个周期投递一次 `SIGALRM`。信号由
//! tokio 的信号驱动接收，节拍动作在阻塞线程池上执行，因此从不在异步信号
//! 上下文中加锁或执行回调。
//!
//! `setitimer(ITIMER_REAL)` makes the kernel deliver `SIGALRM` once per period.
//! The signal is received through tokio's signal driver and the tick action runs
//! on the blocking pool, so nothing locks or runs callbacks in async-signal context.
//!
//! 闹钟定时器是进程级资源，同一时刻只允许一个驱动占用。
//! The alarm timer is process-wide; only one driver may hold it at a time.

use super::TickAction;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

static ALARM_CLAIMED: AtomicBool = AtomicBool::new(false);

/// 进程闹钟的占用凭证，释放时归还
/// Claim on the process alarm, returned on drop
struct AlarmClaim;

impl AlarmClaim {
    fn acquire() -> Result<Self> {
        ALARM_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| AlarmClaim)
            .map_err(|_| Error::AlarmInUse)
    }
}

impl Drop for AlarmClaim {
    fn drop(&mut self) {
        ALARM_CLAIMED.store(false, Ordering::Release);
    }
}

/// 由 `SIGALRM` 驱动的节拍源
/// Tick source driven by `SIGALRM`
pub(crate) struct SignalDriver {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    claim: Option<AlarmClaim>,
}

impl SignalDriver {
    pub(crate) fn install(period: Duration, action: TickAction) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let claim = AlarmClaim::acquire()?;

        let alarms = imp::subscribe().map_err(Error::DriverInstall)?;
        imp::set_interval_timer(period).map_err(Error::DriverInstall)?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = runtime.spawn(imp::run(alarms, stop_rx, action));

        info!(period_secs = period.as_secs(), "Alarm tick source installed");
        Ok(Self {
            stop_tx: Some(stop_tx),
            task: Some(task),
            claim: Some(claim),
        })
    }

    /// 关闭闹钟并分离信号任务。已在执行的节拍会面对已关闭的定时器表。
    /// Disarm the alarm and detach the signal task. A tick already running
    /// finds the timer table closed.
    pub(crate) fn stop(&mut self) {
        let Some(claim) = self.claim.take() else {
            return;
        };

        if let Err(err) = imp::set_interval_timer(Duration::ZERO) {
            warn!(error = %err, "Failed to disarm alarm timer");
        }
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        drop(self.task.take());
        drop(claim);

        info!("Alarm tick source removed");
    }
}

impl Drop for SignalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
mod imp {
    use super::TickAction;
    use std::io;
    use std::time::Duration;
    use tokio::signal::unix::{Signal, SignalKind, signal};
    use tokio::sync::oneshot;
    use tracing::{debug, warn};

    pub(super) fn subscribe() -> io::Result<Signal> {
        signal(SignalKind::alarm())
    }

    /// 设置 `ITIMER_REAL` 的首次到期与周期；零周期即关闭
    /// Set `ITIMER_REAL`'s first expiry and period; a zero period disarms it
    pub(super) fn set_interval_timer(period: Duration) -> io::Result<()> {
        let value = libc::timeval {
            tv_sec: period.as_secs() as libc::time_t,
            tv_usec: period.subsec_micros() as libc::suseconds_t,
        };
        let spec = libc::itimerval {
            it_interval: value,
            it_value: value,
        };

        // SAFETY: `spec` is a valid itimerval for the duration of the call and
        // the previous value is not requested.
        let rc = unsafe { libc::setitimer(libc::ITIMER_REAL, &spec, std::ptr::null_mut()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    pub(super) async fn run(
        mut alarms: Signal,
        mut stop_rx: oneshot::Receiver<()>,
        action: TickAction,
    ) {
        debug!("Alarm signal task started");
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                received = alarms.recv() => {
                    if received.is_none() {
                        break;
                    }
                    let action = action.clone();
                    // 等待本次节拍结束后才接收下一个信号，保证节拍不并发
                    if tokio::task::spawn_blocking(move || action()).await.is_err() {
                        warn!("Tick action did not complete");
                    }
                }
            }
        }
        debug!("Alarm signal task stopped");
    }
}

#[cfg(not(unix))]
mod imp {
    use super::TickAction;
    use std::io;
    use std::time::Duration;
    use tokio::sync::oneshot;

    pub(super) struct Signal;

    pub(super) fn subscribe() -> io::Result<Signal> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "alarm signals are only available on unix",
        ))
    }

    pub(super) fn set_interval_timer(_period: Duration) -> io::Result<()> {
        Ok(())
    }

    pub(super) async fn run(_alarms: Signal, _stop_rx: oneshot::Receiver<()>, _action: TickAction) {}
}
