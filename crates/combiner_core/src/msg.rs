use std::path::PathBuf;

use crate::{Job, JobId, StatusResult, UploadForm};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted the upload form.
    CreateRequested(UploadForm),
    /// Backend accepted the upload and created a job.
    CreateSucceeded(Job),
    /// Backend rejected the upload or the request did not complete.
    CreateFailed { message: String },
    /// Recurring timer fired for a job.
    PollTick { job_id: JobId },
    /// A status check for a job returned.
    StatusChecked { job_id: JobId, result: StatusResult },
    /// User asked to rename a job; `None` when the prompt was dismissed.
    RenameRequested { job_id: JobId, name: Option<String> },
    /// Backend acknowledged the rename with the stored name.
    RenameSucceeded { job_id: JobId, name: String },
    RenameFailed { job_id: JobId, message: String },
    /// User asked to delete a job.
    DeleteRequested { job_id: JobId },
    DeleteSucceeded { job_id: JobId },
    DeleteFailed { job_id: JobId, message: String },
    /// User asked for the result file of a job.
    DownloadRequested { job_id: JobId },
    DownloadFinished {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    /// Resume tracking of jobs known from an earlier session.
    RestoreJobs(Vec<Job>),
}
