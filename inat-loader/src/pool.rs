//! Bounded fan-out for a set of load jobs.
//!
//! The application queues one job per logical dataset at startup. Rather
//! than one thread per job, the pool runs the queue across at most
//! `max_workers` threads; each job still opens and closes its own private
//! connection. A single pool-wide cancel token covers every job.

use crate::event::EventSender;
use crate::job::{CancelToken, LoadJob};
use crate::loader::Loader;
use crate::provider::ConnectionProvider;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::debug;

/// Runs load jobs across a bounded set of worker threads.
#[derive(Debug, Clone)]
pub struct LoaderPool {
    max_workers: usize,
    cancel: CancelToken,
}

impl LoaderPool {
    /// A pool running at most `max_workers` jobs concurrently (at least one).
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            cancel: CancelToken::new(),
        }
    }

    /// The token cancelling every job this pool runs.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Starts the jobs, returning the worker thread handles.
    ///
    /// Jobs run in queue order; a worker picks up the next job as soon as
    /// its current one terminates. Events from different jobs interleave
    /// on the shared channel, distinguished by their stream key.
    pub fn run(
        &self,
        jobs: Vec<LoadJob>,
        provider: Arc<dyn ConnectionProvider>,
        events: EventSender,
    ) -> Vec<JoinHandle<()>> {
        let workers = self.max_workers.min(jobs.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        debug!(workers, "starting loader pool");

        (0..workers)
            .map(|index| {
                let queue = Arc::clone(&queue);
                let provider = Arc::clone(&provider);
                let events = events.clone();
                let cancel = self.cancel.clone();

                std::thread::Builder::new()
                    .name(format!("loader-pool-{index}"))
                    .spawn(move || {
                        while let Some(job) = next_job(&queue) {
                            Loader::with_cancel(
                                job,
                                Arc::clone(&provider),
                                events.clone(),
                                cancel.clone(),
                            )
                            .run();
                        }
                    })
                    .expect("failed to spawn loader pool thread")
            })
            .collect()
    }
}

fn next_job(queue: &Mutex<VecDeque<LoadJob>>) -> Option<LoadJob> {
    queue.lock().expect("loader queue poisoned").pop_front()
}
