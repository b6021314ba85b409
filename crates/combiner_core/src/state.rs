use std::time::Duration;

use crate::view_model::{JobView, TrackerViewModel};
use crate::{Job, JobId, JobStatus};

/// Fixed cadence of status checks for an unfinished job.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    /// Newest job first.
    jobs: Vec<Job>,
    poll_interval: Duration,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn job(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == job_id)
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.job(job_id).is_some()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn view(&self) -> TrackerViewModel {
        let jobs: Vec<JobView> = self.jobs.iter().map(JobView::from).collect();
        TrackerViewModel {
            job_count: jobs.len(),
            active_count: self
                .jobs
                .iter()
                .filter(|job| !job.status.is_terminal())
                .count(),
            jobs,
        }
    }

    pub(crate) fn insert_front(&mut self, job: Job) {
        self.jobs.insert(0, job);
    }

    pub(crate) fn push_back(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub(crate) fn remove(&mut self, job_id: &JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|job| &job.id == job_id)?;
        Some(self.jobs.remove(index))
    }

    pub(crate) fn set_status(&mut self, job_id: &JobId, status: JobStatus) {
        if let Some(job) = self.jobs.iter_mut().find(|job| &job.id == job_id) {
            job.status = status;
        }
    }

    pub(crate) fn set_name(&mut self, job_id: &JobId, name: String) {
        if let Some(job) = self.jobs.iter_mut().find(|job| &job.id == job_id) {
            job.name = name;
        }
    }
}
