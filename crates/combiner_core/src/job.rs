use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Opaque job identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Error,
    ];

    /// Wire representation used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Capitalized label shown next to the status icon.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Error => "Error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Position in the lifecycle; a job never moves to a lower rank.
    pub(crate) fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Error => 2,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the four values the backend is known to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedStatus(pub String);

impl fmt::Display for UnrecognizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized status {:?}", self.0)
    }
}

impl std::error::Error for UnrecognizedStatus {}

impl FromStr for JobStatus {
    type Err = UnrecognizedStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnrecognizedStatus(raw.to_string()))
    }
}

/// One uploaded source file, as listed by the backend at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub upload_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub generation_time: String,
    /// Upload order is display order.
    pub files: Vec<UploadedFile>,
    pub status: JobStatus,
}

/// User input for a creation request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadForm {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// Outcome of one status check for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResult {
    /// The backend returned a recognized status different from the current one.
    Updated(JobStatus),
    /// The backend returned the status the job already has.
    Unchanged,
    /// Network error, non-success HTTP status or an unrecognized status value.
    TransportFailure(String),
}
