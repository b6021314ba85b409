use crate::{Job, JobId, JobStatus, UploadedFile};

/// Actions that depend on a job's status. Rename and delete are always offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub can_download: bool,
}

impl Affordances {
    pub fn for_status(status: JobStatus) -> Self {
        Self {
            can_download: status == JobStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerViewModel {
    pub jobs: Vec<JobView>,
    pub job_count: usize,
    /// Jobs still pending or processing.
    pub active_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: JobId,
    pub name: String,
    pub generation_time: String,
    pub files: Vec<UploadedFile>,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub affordances: Affordances,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name.clone(),
            generation_time: job.generation_time.clone(),
            files: job.files.clone(),
            status: job.status,
            status_label: job.status.label(),
            affordances: Affordances::for_status(job.status),
        }
    }
}
