//! 专用线程节拍源
//! Dedicated thread tick source

use super::TickAction;
use crate::error::{Error, Result};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 在专用线程上循环"节拍，然后等待一个周期"的驱动
/// Driver looping "tick, then wait one period" on a dedicated thread
pub(crate) struct ThreadDriver {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadDriver {
    pub(crate) fn spawn(name: &str, period: Duration, action: TickAction) -> Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                info!("Tick thread started");
                let mut deadline = Instant::now();
                loop {
                    action();

                    // 落后时不补发节拍，从当前时刻重新计时
                    deadline += period;
                    let now = Instant::now();
                    if deadline <= now {
                        deadline = now + period;
                    }

                    match stop_rx.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("Tick thread stopped");
            })
            .map_err(Error::DriverInstall)?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// 通知线程退出并等待其结束。正在进行的节拍会先完成。
    /// Tell the thread to exit and join it. A tick in progress completes first.
    pub(crate) fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        if let Some(Err(_)) = self.handle.take().map(JoinHandle::join) {
            warn!("Tick thread terminated abnormally");
        }
    }
}

impl Drop for ThreadDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_tick_is_immediate_and_stop_joins() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let action: TickAction = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut driver =
            ThreadDriver::spawn("tick-test", Duration::from_millis(50), action).unwrap();
        thread::sleep(Duration::from_millis(180));
        driver.stop();

        let observed = ticks.load(Ordering::SeqCst);
        assert!((2..=5).contains(&observed), "observed {observed} ticks");

        thread::sleep(Duration::from_millis(120));
        assert_eq!(ticks.load(Ordering::SeqCst), observed);
    }

    #[test]
    fn test_stop_is_prompt_during_long_period() {
        let action: TickAction = Arc::new(|| {});
        let mut driver =
            ThreadDriver::spawn("tick-long", Duration::from_secs(60), action).unwrap();

        let started = Instant::now();
        driver.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
