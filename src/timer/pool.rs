//! 卸载分发使用的工作线程池
//! Worker pool used by offloaded dispatch
//!
//! 工作线程从一个无界队列中取出任务执行。提交是"发出即忘"的：提交方不会
//! 得到任何结果，也不会因为队列积压而被阻塞。
//!
//! Workers pull jobs from an unbounded queue. Submission is fire-and-forget:
//! the submitter gets no result and is never blocked by a backlog.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// 一个待执行的任务
/// A unit of work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// 固定大小的工作线程池
/// Fixed-size worker pool
pub struct WorkerPool {
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    /// 已入队但尚未开始执行的任务数
    /// Jobs queued but not yet started
    pending: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// 创建线程池。`size_hint` 为 0 时使用可用的并行度。
    /// 任一工作线程创建失败时，已创建的线程会被回收并返回错误。
    ///
    /// Create the pool. A `size_hint` of 0 uses the available parallelism.
    /// If any worker fails to spawn, the ones already spawned are joined and
    /// an error is returned.
    pub fn new(size_hint: usize, name_prefix: &str) -> Result<Self> {
        let size = match size_hint {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(size);

        for index in 0..size {
            let rx = job_rx.clone();
            let pending = pending.clone();
            let spawned = thread::Builder::new()
                .name(format!("{name_prefix}-{index}"))
                .spawn(move || worker_loop(rx, pending));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    warn!(index, error = %err, "Failed to spawn pool worker, rolling back");
                    drop(job_tx);
                    join_all(workers);
                    return Err(Error::PoolInit(err));
                }
            }
        }

        debug!(workers = size, "Worker pool started");
        Ok(Self {
            job_tx: Some(job_tx),
            workers,
            pending,
        })
    }

    /// 提交一个任务，不等待其执行
    /// Submit a job without waiting for it to run
    pub fn submit(&self, job: Job) {
        let Some(job_tx) = &self.job_tx else {
            warn!("Job submitted to a stopped worker pool, dropping it");
            return;
        };

        self.pending.fetch_add(1, Ordering::Relaxed);
        if job_tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::Relaxed);
            warn!("Worker pool queue is closed, dropping job");
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// 已入队但尚未开始执行的任务数
    /// Number of jobs queued but not yet started
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// 关闭队列，等待工作线程执行完已入队的任务后退出
    /// Close the queue and wait for workers to finish already-queued jobs
    pub fn shutdown(&mut self) {
        if self.job_tx.take().is_none() {
            return;
        }
        join_all(std::mem::take(&mut self.workers));
        debug!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(job_rx: Receiver<Job>, pending: Arc<AtomicUsize>) {
    while let Ok(job) = job_rx.recv() {
        pending.fetch_sub(1, Ordering::Relaxed);
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!("Offloaded timer callback panicked");
        } else {
            trace!("Offloaded job completed");
        }
    }
}

fn join_all(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        if worker.join().is_err() {
            warn!("Pool worker terminated abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pool_runs_submitted_jobs() {
        let mut pool = WorkerPool::new(2, "test-worker").unwrap();
        assert_eq!(pool.size(), 2);

        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        for i in 0..8 {
            let done_tx = done_tx.clone();
            pool.submit(Box::new(move || {
                done_tx.send(i).unwrap();
            }));
        }

        let mut seen: Vec<i32> = (0..8)
            .map(|_| done_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());

        pool.shutdown();
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn test_zero_hint_uses_available_parallelism() {
        let pool = WorkerPool::new(0, "auto-worker").unwrap();
        assert!(pool.size() >= 1);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let mut pool = WorkerPool::new(1, "drain-worker").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = counter.clone();
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(pool.pending_jobs(), 0);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let mut pool = WorkerPool::new(1, "panic-worker").unwrap();
        pool.submit(Box::new(|| panic!("callback failure")));

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        pool.submit(Box::new(move || {
            done_tx.send(()).unwrap();
        }));
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
        pool.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_is_dropped() {
        let mut pool = WorkerPool::new(1, "late-worker").unwrap();
        pool.shutdown();
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = ran.clone();
        pool.submit(Box::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
