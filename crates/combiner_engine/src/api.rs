use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use combiner_core::{Job, JobId, JobStatus, UploadForm, UploadedFile};
use combiner_logging::{combiner_debug, combiner_warn};
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio_util::io::ReaderStream;

use crate::persist::StagedFile;
use crate::{ApiError, FailureKind};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Path under `base_url` where the job endpoints live.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Downloads stream whole result files and get a longer budget.
    pub download_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_prefix: "/cronBach/api/job".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(300),
        }
    }
}

/// The backend job API consumed by the tracker.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// Upload the form's files and create a job from them.
    async fn create(&self, form: &UploadForm) -> Result<Job, ApiError>;

    /// Read the raw status string of a job; validation is the caller's concern.
    async fn status(&self, job_id: &JobId) -> Result<String, ApiError>;

    /// Rename a job, returning the name the backend stored.
    async fn rename(&self, job_id: &JobId, name: &str) -> Result<String, ApiError>;

    async fn delete(&self, job_id: &JobId) -> Result<(), ApiError>;

    /// Stream the result file of a job into `dest_dir`, returning its path.
    async fn download(&self, job_id: &JobId, dest_dir: &Path) -> Result<PathBuf, ApiError>;
}

/// Builds endpoint and navigation URLs below the configured API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    prefix: Vec<String>,
}

impl Endpoints {
    pub fn new(base_url: &str, api_prefix: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        let prefix = api_prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Ok(Self { base, prefix })
    }

    /// Appends percent-encoded `segments` to the prefix.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(self.prefix.iter().map(String::as_str))
                .extend(segments.iter().copied());
        }
        url
    }

    pub fn download_url(&self, job_id: &JobId) -> Url {
        self.url(&["download", job_id.as_str()])
    }

    /// Link to one of the source files of a job.
    pub fn upload_url(&self, file: &UploadedFile) -> Url {
        self.url(&["uploads", &file.upload_id, &file.filename])
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    settings: ApiSettings,
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let endpoints = Endpoints::new(&settings.base_url, &settings.api_prefix)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            endpoints,
            client,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn create(&self, form: &UploadForm) -> Result<Job, ApiError> {
        let mut multipart = Form::new().text("name", form.name.clone());
        for path in &form.files {
            multipart = multipart.part("file", file_part(path).await?);
        }

        let response = self
            .client
            .post(self.endpoints.url(&["create"]))
            .multipart(multipart)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: CreateJobResponse = decode_json(ensure_success(response).await?).await?;
        Ok(body.into_job())
    }

    async fn status(&self, job_id: &JobId) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.endpoints.url(&["status", job_id.as_str()]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: StatusResponse = decode_json(ensure_success(response).await?).await?;
        Ok(body.status)
    }

    async fn rename(&self, job_id: &JobId, name: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .put(self.endpoints.url(&["rename", job_id.as_str()]))
            .json(&RenameRequest { name })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: RenameResponse = decode_json(ensure_success(response).await?).await?;
        Ok(body.name)
    }

    async fn delete(&self, job_id: &JobId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoints.url(&["delete", job_id.as_str()]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn download(&self, job_id: &JobId, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let response = self
            .client
            .get(self.endpoints.download_url(job_id))
            .timeout(self.settings.download_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| format!("{job_id}.bin"));

        let mut staged = StagedFile::create(dest_dir).map_err(io_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            staged.write_chunk(&chunk).map_err(io_error)?;
        }
        combiner_debug!(
            "Downloaded job_id={} bytes={} file={}",
            job_id,
            staged.bytes_written(),
            filename
        );
        staged.persist(&filename).map_err(io_error)
    }
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;
    let len = file
        .metadata()
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, format!("{}: {err}", path.display())))?
        .len();
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    Ok(Part::stream_with_length(body, len).file_name(filename))
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(ApiError::new(
        FailureKind::HttpStatus(status.as_u16()),
        error_message(status, &body),
    ))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
}

/// Prefer the backend's `error` field, then a FastAPI `detail`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn attachment_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let value = param.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        // Never let the server pick a directory.
        let name = Path::new(value).file_name()?.to_str()?;
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

fn io_error(err: crate::PersistError) -> ApiError {
    ApiError::new(FailureKind::Io, err.to_string())
}

#[derive(Debug, Deserialize)]
struct CreateJobResponse {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(default)]
    generation_time: String,
    #[serde(default, deserialize_with = "ordered_files")]
    files: Vec<UploadedFile>,
    #[serde(default)]
    status: Option<String>,
}

impl CreateJobResponse {
    fn into_job(self) -> Job {
        let status = match self.status.as_deref() {
            None => JobStatus::Pending,
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                combiner_warn!("Job {} created with {}; tracking as pending", self.id, err);
                JobStatus::Pending
            }),
        };
        Job {
            id: JobId::new(self.id),
            name: self.name,
            generation_time: self.generation_time,
            files: self.files,
            status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RenameResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        if let Some(error) = self.error {
            return Some(error);
        }
        match self.detail? {
            serde_json::Value::String(detail) => Some(detail),
            other => Some(other.to_string()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

/// Reads the `{upload_id: filename}` object keeping document order.
fn ordered_files<'de, D>(deserializer: D) -> Result<Vec<UploadedFile>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FilesVisitor;

    impl<'de> Visitor<'de> for FilesVisitor {
        type Value = Vec<UploadedFile>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of upload id to filename")
        }

        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut files = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((upload_id, filename)) = map.next_entry::<String, String>()? {
                files.push(UploadedFile {
                    upload_id,
                    filename,
                });
            }
            Ok(files)
        }
    }

    deserializer.deserialize_map(FilesVisitor)
}
