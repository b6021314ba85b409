use std::path::PathBuf;
use std::time::Duration;

use crate::{JobId, JobStatus, JobView, UploadForm};

/// User-facing operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Rename,
    Delete,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitCreate(UploadForm),
    SchedulePolling { job_id: JobId, interval: Duration },
    CancelPolling { job_id: JobId },
    CheckStatus { job_id: JobId, current: JobStatus },
    SubmitRename { job_id: JobId, name: String },
    SubmitDelete { job_id: JobId },
    StartDownload { job_id: JobId },
    NotifyCreated(JobView),
    NotifyStatus { job_id: JobId, status: JobStatus },
    NotifyRenamed { job_id: JobId, name: String },
    NotifyRemoved { job_id: JobId },
    NotifyDownloaded { job_id: JobId, path: PathBuf },
    NotifyFailure {
        operation: Operation,
        job_id: Option<JobId>,
        message: String,
    },
}
