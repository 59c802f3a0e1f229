use crate::errors::{EmberError, EmberResult, ErrorKind};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// A fixed pool of worker threads that runs background units of work,
/// such as asynchronous index builds.
///
/// Jobs are queued on a bounded channel. Submitting never blocks: a full
/// queue rejects the job with [`ErrorKind::IndexingError`]. A panicking job is logged and does not take its worker down.
/// [`TaskExecutor::shutdown`] stops accepting work, lets the workers drain
/// the queue and joins them.
#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<TaskExecutorInner>,
}

struct TaskExecutorInner {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl TaskExecutor {
    pub fn new(worker_count: usize) -> EmberResult<TaskExecutor> {
        if worker_count == 0 {
            log::error!("Task executor needs at least one worker");
            return Err(EmberError::new(
                "Task executor needs at least one worker",
                ErrorKind::ValidationError,
            ));
        }

        let (sender, receiver) = bounded::<Job>(worker_count * QUEUE_DEPTH_PER_WORKER);
        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("emberdb-worker-{}", worker_id))
                .spawn(move || {
                    for job in receiver.iter() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            log::error!("Background task panicked on worker {}", worker_id);
                        }
                    }
                })?;
            workers.push(handle);
        }

        log::debug!("Started task executor with {} workers", worker_count);
        Ok(TaskExecutor {
            inner: Arc::new(TaskExecutorInner {
                sender: Mutex::new(Some(sender)),
                workers: Mutex::new(workers),
                worker_count,
            }),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.inner.worker_count
    }

    /// Queues `op` for execution on a worker thread.
    pub fn submit<OP>(&self, op: OP) -> EmberResult<()>
    where
        OP: FnOnce() + Send + 'static,
    {
        let sender = self.inner.sender.lock().clone();
        match sender {
            Some(sender) => sender.try_send(Box::new(op)).map_err(|err| match err {
                TrySendError::Full(_) => {
                    log::error!(
                        "Task executor queue is full with {} pending jobs",
                        sender.len()
                    );
                    EmberError::new("Task executor queue is full", ErrorKind::IndexingError)
                }
                TrySendError::Disconnected(_) => {
                    log::error!("Task executor queue is disconnected");
                    EmberError::new("Task executor queue is disconnected", ErrorKind::InternalError)
                }
            }),
            None => {
                log::error!("Task executor is shut down");
                Err(EmberError::new(
                    "Task executor is shut down",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Stops accepting work, waits for queued jobs to finish and joins the workers.
    pub fn shutdown(&self) {
        drop(self.inner.sender.lock().take());
        let workers: Vec<JoinHandle<()>> = self.inner.workers.lock().drain(..).collect();
        let current = thread::current().id();
        for worker in workers {
            // a job that shuts the executor down cannot join its own thread
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::warn!("Task executor worker exited abnormally");
            }
        }
    }
}
