use std::collections::HashMap;
use std::time::Duration;

use combiner_core::JobId;
use combiner_logging::combiner_debug;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// An active recurring status check for one job. Dropping it stops the timer.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owns every polling timer, at most one per job id.
///
/// Must be used from within a tokio runtime; timers are tokio tasks.
#[derive(Debug, Default)]
pub struct JobRegistry {
    handles: HashMap<JobId, PollHandle>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `poll_fn` every `interval`, first one interval from now, until the
    /// job is cancelled or `poll_fn` returns `false`.
    ///
    /// Returns `false` without doing anything when the job already has a handle.
    pub fn schedule<F>(&mut self, job_id: JobId, interval: Duration, mut poll_fn: F) -> bool
    where
        F: FnMut(&JobId) -> bool + Send + 'static,
    {
        if self.handles.contains_key(&job_id) {
            combiner_debug!("Polling already scheduled for job_id={}", job_id);
            return false;
        }

        let interval = interval.max(MIN_INTERVAL);
        let tick_id = job_id.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !poll_fn(&tick_id) {
                    break;
                }
            }
        });

        combiner_debug!(
            "Scheduled polling job_id={} interval_ms={}",
            job_id,
            interval.as_millis()
        );
        self.handles.insert(job_id, PollHandle { task });
        true
    }

    /// Stops and forgets the job's timer. Returns whether one existed.
    pub fn cancel(&mut self, job_id: &JobId) -> bool {
        let existed = self.handles.remove(job_id).is_some();
        if existed {
            combiner_debug!("Cancelled polling job_id={}", job_id);
        }
        existed
    }

    pub fn has(&self, job_id: &JobId) -> bool {
        self.handles.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn cancel_all(&mut self) {
        self.handles.clear();
    }
}
