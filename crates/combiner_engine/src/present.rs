use std::path::Path;

use combiner_core::{JobId, JobStatus, JobView, Operation};

/// Renders job state; the controller only ever writes to it.
pub trait PresentationAdapter {
    fn apply_job_created(&mut self, job: &JobView);

    fn apply_status(&mut self, job_id: &JobId, status: JobStatus);

    fn apply_renamed(&mut self, job_id: &JobId, name: &str);

    fn apply_removed(&mut self, job_id: &JobId);

    fn apply_downloaded(&mut self, _job_id: &JobId, _path: &Path) {}

    /// Surface a failed user operation.
    fn report_failure(&mut self, operation: Operation, job_id: Option<&JobId>, message: &str);
}
