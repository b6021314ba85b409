#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use combiner_core::{Job, JobId, JobStatus, JobView, Operation, UploadForm, UploadedFile};
use combiner_engine::{ApiError, FailureKind, JobApi, PresentationAdapter};
use tokio::sync::Semaphore;

pub fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: JobId::from(id),
        name: "survey".to_string(),
        generation_time: "2024-10-01 12:00".to_string(),
        files: vec![UploadedFile {
            upload_id: "u1".to_string(),
            filename: "a.xlsx".to_string(),
        }],
        status,
    }
}

pub fn network_error() -> ApiError {
    ApiError::new(FailureKind::Network, "connection refused")
}

/// Scripted backend. Status answers are consumed in order.
#[derive(Default)]
pub struct FakeApi {
    create_result: Mutex<Option<Result<Job, ApiError>>>,
    statuses: Mutex<VecDeque<Result<String, ApiError>>>,
    rename_error: Mutex<Option<ApiError>>,
    delete_error: Mutex<Option<ApiError>>,
    status_gate: Option<Arc<Semaphore>>,
    pub create_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub rename_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creating(self, result: Result<Job, ApiError>) -> Self {
        *self.create_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = Result<&'static str, ApiError>>,
    {
        self.statuses
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(|s| s.map(str::to_string)));
        self
    }

    pub fn failing_rename(self, err: ApiError) -> Self {
        *self.rename_error.lock().unwrap() = Some(err);
        self
    }

    pub fn failing_delete(self, err: ApiError) -> Self {
        *self.delete_error.lock().unwrap() = Some(err);
        self
    }

    /// Status calls wait for a permit on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn create(&self, _form: &UploadForm) -> Result<Job, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(network_error()))
    }

    async fn status(&self, _job_id: &JobId) -> Result<String, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.status_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(network_error()))
    }

    async fn rename(&self, _job_id: &JobId, name: &str) -> Result<String, ApiError> {
        self.rename_calls.fetch_add(1, Ordering::SeqCst);
        match self.rename_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(name.to_string()),
        }
    }

    async fn delete(&self, _job_id: &JobId) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        match self.delete_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn download(&self, job_id: &JobId, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        Ok(dest_dir.join(format!("{job_id}.xlsx")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Created(JobId, JobStatus),
    Status(JobId, JobStatus),
    Renamed(JobId, String),
    Removed(JobId),
    Downloaded(JobId, PathBuf),
    Failure(Operation, Option<JobId>, String),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub shown: Vec<Shown>,
}

impl PresentationAdapter for RecordingPresenter {
    fn apply_job_created(&mut self, job: &JobView) {
        self.shown
            .push(Shown::Created(job.job_id.clone(), job.status));
    }

    fn apply_status(&mut self, job_id: &JobId, status: JobStatus) {
        self.shown.push(Shown::Status(job_id.clone(), status));
    }

    fn apply_renamed(&mut self, job_id: &JobId, name: &str) {
        self.shown
            .push(Shown::Renamed(job_id.clone(), name.to_string()));
    }

    fn apply_removed(&mut self, job_id: &JobId) {
        self.shown.push(Shown::Removed(job_id.clone()));
    }

    fn apply_downloaded(&mut self, job_id: &JobId, path: &Path) {
        self.shown
            .push(Shown::Downloaded(job_id.clone(), path.to_path_buf()));
    }

    fn report_failure(&mut self, operation: Operation, job_id: Option<&JobId>, message: &str) {
        self.shown.push(Shown::Failure(
            operation,
            job_id.cloned(),
            message.to_string(),
        ));
    }
}
