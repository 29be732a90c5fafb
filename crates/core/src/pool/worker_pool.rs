use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::shared::constants::{POOL_QUEUE_CAPACITY, POOL_RECV_TIMEOUT_MS};

/// How long `shutdown` waits for workers before abandoning them.
const JOIN_DEADLINE: Duration = Duration::from_secs(2);

pub type JobError = Box<dyn std::error::Error + Send + Sync>;

/// Fixed-size worker pool: N threads pull jobs from a bounded input queue
/// and push results to a bounded output queue.
///
/// Contract shared by all pipeline pools:
/// - submission and polling are non-blocking; a full queue drops the
///   newest item (documented backpressure, never unbounded growth);
/// - a failing job is logged and dropped, the worker survives;
/// - workers block on receive with a timeout so a shutdown flag flip is
///   observed within [`POOL_RECV_TIMEOUT_MS`];
/// - `shutdown` is cooperative: flag, drain, join with a deadline.
///   In-flight jobs finish naturally.
pub struct WorkerPool<J: Send + 'static, O: Send + 'static> {
    name: &'static str,
    input_tx: Sender<J>,
    input_rx: Receiver<J>,
    output_rx: Receiver<O>,
    workers: Vec<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl<J: Send + 'static, O: Send + 'static> WorkerPool<J, O> {
    /// Spawns `num_workers` threads, each running `process` on every job.
    /// `process` is shared across workers and must be thread-safe.
    pub fn new<F>(name: &'static str, num_workers: usize, process: F) -> Self
    where
        F: Fn(J) -> Result<O, JobError> + Send + Sync + 'static,
    {
        let num_workers = num_workers.max(1);
        let (input_tx, input_rx) = crossbeam_channel::bounded::<J>(POOL_QUEUE_CAPACITY);
        let (output_tx, output_rx) = crossbeam_channel::bounded::<O>(POOL_QUEUE_CAPACITY);
        let active = Arc::new(AtomicBool::new(true));
        let process = Arc::new(process);

        let workers = (0..num_workers)
            .map(|i| {
                let input_rx = input_rx.clone();
                let output_tx = output_tx.clone();
                let active = Arc::clone(&active);
                let process = Arc::clone(&process);
                std::thread::Builder::new()
                    .name(format!("{name}-worker-{i}"))
                    .spawn(move || {
                        worker_loop(name, &input_rx, &output_tx, &active, process.as_ref())
                    })
                    .expect("failed to spawn pool worker")
            })
            .collect();

        Self {
            name,
            input_tx,
            input_rx,
            output_rx,
            workers,
            active,
        }
    }

    /// Non-blocking submit. Returns false when the pool is shut down or
    /// the input queue is full (the job is dropped).
    pub fn submit(&self, job: J) -> bool {
        if !self.active.load(Ordering::Relaxed) {
            return false;
        }
        match self.input_tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("{}: input queue full, dropping submission", self.name);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Non-blocking poll for one result.
    pub fn poll(&self) -> Option<O> {
        self.output_rx.try_recv().ok()
    }

    pub fn queued_jobs(&self) -> usize {
        self.input_rx.len()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Cooperative shutdown: flips the flag, drains both queues, then
    /// joins workers until [`JOIN_DEADLINE`] expires. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.active.swap(false, Ordering::Relaxed) {
            return;
        }

        while self.input_rx.try_recv().is_ok() {}
        while self.output_rx.try_recv().is_ok() {}

        let deadline = Instant::now() + JOIN_DEADLINE;
        for worker in self.workers.drain(..) {
            while !worker.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            if worker.is_finished() {
                if worker.join().is_err() {
                    log::error!("{}: worker panicked", self.name);
                }
            } else {
                log::warn!("{}: worker did not stop before deadline", self.name);
            }
        }
    }
}

impl<J: Send + 'static, O: Send + 'static> Drop for WorkerPool<J, O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<J, O>(
    name: &str,
    input_rx: &Receiver<J>,
    output_tx: &Sender<O>,
    active: &AtomicBool,
    process: &(impl Fn(J) -> Result<O, JobError> + ?Sized),
) {
    let timeout = Duration::from_millis(POOL_RECV_TIMEOUT_MS);
    while active.load(Ordering::Relaxed) {
        let job = match input_rx.recv_timeout(timeout) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match process(job) {
            Ok(result) => {
                if let Err(TrySendError::Full(_)) = output_tx.try_send(result) {
                    log::debug!("{name}: output queue full, dropping result");
                }
            }
            Err(e) => log::error!("{name}: job failed: {e}"),
        }
    }
}
