//! Bounded worker pool for analysis tasks.
//!
//! # Design
//!
//! - `WorkerConfig` decides the thread count (available parallelism clamped
//!   to a range, or an explicit override)
//! - Jobs go through a bounded `sync_channel`; workers share its receiver
//! - Submission never blocks: when the queue is full the submitting thread
//!   runs the job itself (caller-runs back-pressure)
//! - Workers are detached and exit once the pool is dropped and the queue
//!   has drained; they never hold up process exit
//! - A panicking job is caught and logged; its worker keeps running

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use super::handle::lock;

/// Default capacity of the job queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A unit of work for the pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for worker scaling.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Minimum number of workers
    pub min_workers: usize,
    /// Maximum number of workers when sizing from available parallelism
    pub max_workers: usize,
    /// Explicit worker count (takes precedence)
    pub user_override: Option<usize>,
    /// Jobs that may wait in the queue before callers run them inline
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 8,
            user_override: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Number of worker threads to start.
    pub fn worker_count(&self) -> usize {
        if let Some(count) = self.user_override {
            return count.max(1);
        }

        let cpu_count = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        let max = self.max_workers.max(1);
        cpu_count.clamp(self.min_workers.clamp(1, max), max)
    }
}

/// How a submitted job was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Handed to the worker queue
    Queued,
    /// The queue was full; the job already ran on the submitting thread
    CallerRan,
}

/// Counters of how jobs were accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub queued: usize,
    pub ran_inline: usize,
}

/// Fixed-size pool of detached worker threads.
pub struct WorkerPool {
    sender: SyncSender<Job>,
    size: usize,
    queued: AtomicUsize,
    ran_inline: AtomicUsize,
}

impl WorkerPool {
    /// Start a pool sized by `config`.
    pub fn new(config: &WorkerConfig) -> io::Result<Self> {
        Self::spawn(config.worker_count(), config.queue_capacity)
    }

    /// Start a pool with exactly `size` workers and the default queue.
    pub fn with_size(size: usize) -> io::Result<Self> {
        Self::spawn(size.max(1), DEFAULT_QUEUE_CAPACITY)
    }

    fn spawn(size: usize, capacity: usize) -> io::Result<Self> {
        let (sender, receiver) = mpsc::sync_channel::<Job>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for i in 0..size {
            let rx = Arc::clone(&receiver);
            thread::Builder::new()
                .name(format!("vlm-worker-{}", i))
                .spawn(move || worker_loop(rx))?;
        }
        debug!(workers = size, queue_capacity = capacity, "worker pool started");

        Ok(Self {
            sender,
            size,
            queued: AtomicUsize::new(0),
            ran_inline: AtomicUsize::new(0),
        })
    }

    /// Submit a job without blocking.
    ///
    /// If the queue is full the job runs to completion on the calling
    /// thread before this returns.
    pub fn submit<F>(&self, job: F) -> Submission
    where
        F: FnOnce() + Send + 'static,
    {
        match self.sender.try_send(Box::new(job)) {
            Ok(()) => {
                self.queued.fetch_add(1, Ordering::Relaxed);
                Submission::Queued
            }
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                debug!("worker queue saturated, running job on caller thread");
                self.ran_inline.fetch_add(1, Ordering::Relaxed);
                run_guarded(job);
                Submission::CallerRan
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            queued: self.queued.load(Ordering::Relaxed),
            ran_inline: self.ran_inline.load(Ordering::Relaxed),
        }
    }
}

fn worker_loop(rx: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let rx = lock(&rx);
            match rx.recv() {
                Ok(job) => job,
                Err(_) => return, // pool dropped
            }
        };
        run_guarded(job);
    }
}

fn run_guarded(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        let name = thread::current().name().unwrap_or("caller").to_string();
        warn!(thread = %name, "analysis job panicked");
    }
}
