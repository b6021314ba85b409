use std::fs;
use std::path::Path;

use chrono::Utc;
use combiner_core::{Job, JobId, JobStatus, UploadedFile};
use combiner_engine::AtomicFileWriter;
use combiner_logging::{combiner_error, combiner_info, combiner_warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedFile {
    upload_id: String,
    filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedJob {
    id: String,
    name: String,
    generation_time: String,
    files: Vec<PersistedFile>,
    status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    #[serde(default)]
    saved_utc: Option<String>,
    jobs: Vec<PersistedJob>,
}

/// Jobs tracked by an earlier run, newest first. Missing or unreadable state
/// yields an empty list.
pub(crate) fn load_jobs(path: &Path) -> Vec<Job> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            combiner_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            combiner_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let jobs: Vec<Job> = state.jobs.into_iter().map(restore_job).collect();
    combiner_info!("Loaded {} persisted jobs from {:?}", jobs.len(), path);
    jobs
}

/// Returns whether the state was written.
pub(crate) fn save_jobs(path: &Path, jobs: &[Job]) -> bool {
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        combiner_error!("State file path {:?} has no usable file name", path);
        return false;
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let state = PersistedState {
        saved_utc: Some(Utc::now().to_rfc3339()),
        jobs: jobs.iter().map(persist_job).collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            combiner_error!("Failed to serialize persisted state: {}", err);
            return false;
        }
    };

    let writer = AtomicFileWriter::new(dir);
    match writer.write(filename, &content) {
        Ok(_) => true,
        Err(err) => {
            combiner_error!("Failed to write persisted state to {:?}: {}", path, err);
            false
        }
    }
}

fn persist_job(job: &Job) -> PersistedJob {
    PersistedJob {
        id: job.id.to_string(),
        name: job.name.clone(),
        generation_time: job.generation_time.clone(),
        files: job
            .files
            .iter()
            .map(|file| PersistedFile {
                upload_id: file.upload_id.clone(),
                filename: file.filename.clone(),
            })
            .collect(),
        status: job.status.as_str().to_string(),
    }
}

fn restore_job(job: PersistedJob) -> Job {
    // An unknown status is re-validated by the next poll.
    let status = job.status.parse().unwrap_or_else(|err| {
        combiner_warn!("Persisted job {} has {}; tracking as pending", job.id, err);
        JobStatus::Pending
    });
    Job {
        id: JobId::new(job.id),
        name: job.name,
        generation_time: job.generation_time,
        files: job
            .files
            .into_iter()
            .map(|file| UploadedFile {
                upload_id: file.upload_id,
                filename: file.filename,
            })
            .collect(),
        status,
    }
}
