use std::sync::Arc;

use combiner_core::{JobId, JobStatus, StatusResult};

use crate::{ApiError, FailureKind, JobApi};

/// Performs single status checks against the backend.
pub struct StatusPoller<A> {
    api: Arc<A>,
}

impl<A> Clone for StatusPoller<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: JobApi> StatusPoller<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// One status read for `job_id`, compared with the status it has now.
    ///
    /// Unknown status values are reported as transport failures so the state
    /// machine never advances into a state it does not know.
    pub async fn check(&self, job_id: &JobId, current: JobStatus) -> StatusResult {
        match self.api.status(job_id).await {
            Ok(raw) => match raw.parse::<JobStatus>() {
                Ok(status) if status == current => StatusResult::Unchanged,
                Ok(status) => StatusResult::Updated(status),
                Err(unknown) => {
                    let err = ApiError::new(
                        FailureKind::UnrecognizedStatus(unknown.0),
                        "status outside the known set",
                    );
                    StatusResult::TransportFailure(err.to_string())
                }
            },
            Err(err) => StatusResult::TransportFailure(err.to_string()),
        }
    }
}
