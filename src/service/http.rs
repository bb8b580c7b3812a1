//! reqwest-backed conversion service client.

use super::{ConversionService, GENERIC_SUBMISSION_FAILURE, RETRIEVAL_FAILURE_PREFIX};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::types::{
    Artifact, SelectedFile, ServiceErrorBody, TaskId, TaskSnapshot, UploadResponse,
};
use crate::utils::resolve_artifact_filename;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use url::Url;

/// Header carrying the anti-forgery token on uploads
pub const CSRF_HEADER: &str = "X-CSRFToken";

const UPLOAD_PATH: &str = "api/upload/";
const CLEANUP_PATH: &str = "api/cleanup/";

/// HTTP client for the conversion service's REST API
///
/// Endpoints, relative to the configured base URL:
/// - `POST api/upload/` - multipart upload, field `file`
/// - `GET api/task/{task_id}/` - task status
/// - `GET api/download/{task_id}/` - converted PDF
/// - `POST api/cleanup/` - purge stale files
#[derive(Clone)]
pub struct HttpConversionService {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    csrf_cookie_name: String,
}

impl HttpConversionService {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {}", e),
                key: None,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url()?,
            credentials,
            csrf_cookie_name: config.csrf_cookie_name.clone(),
        })
    }

    /// Base URL all API paths are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    fn task_endpoint(
        &self,
        resource: &str,
        task_id: &TaskId,
    ) -> std::result::Result<Url, url::ParseError> {
        self.endpoint(&format!(
            "api/{}/{}/",
            resource,
            urlencoding::encode(task_id.as_str())
        ))
    }
}

/// Read the service's `{ "error": "..." }` body, if the response carries one
async fn service_error_message(response: reqwest::Response) -> Option<String> {
    let body = response.bytes().await.ok()?;
    serde_json::from_slice::<ServiceErrorBody>(&body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.is_empty())
}

fn status_code_message(status: reqwest::StatusCode) -> String {
    format!("Request failed with status code {}", status.as_u16())
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn submit(&self, file: &SelectedFile) -> Result<TaskId> {
        let url = self.endpoint(UPLOAD_PATH).map_err(|e| {
            tracing::error!(error = %e, "cannot build upload URL");
            Error::Submission(GENERIC_SUBMISSION_FAILURE.to_string())
        })?;

        let part = Part::bytes(file.content.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);
        let mut request = self.client.post(url).multipart(form);

        match self.credentials.get(&self.csrf_cookie_name) {
            Some(token) => request = request.header(CSRF_HEADER, token),
            None => tracing::debug!(
                cookie = %self.csrf_cookie_name,
                "no CSRF token available, uploading without it"
            ),
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(file = %file.name, error = %e, "upload request failed");
            Error::Submission(GENERIC_SUBMISSION_FAILURE.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = service_error_message(response)
                .await
                .unwrap_or_else(|| GENERIC_SUBMISSION_FAILURE.to_string());
            tracing::warn!(file = %file.name, status = %status, error = %message, "upload rejected");
            return Err(Error::Submission(message));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            tracing::warn!(file = %file.name, error = %e, "upload response has no task id");
            Error::Submission(GENERIC_SUBMISSION_FAILURE.to_string())
        })?;

        tracing::info!(
            task_id = %body.task_id,
            file = %file.name,
            size_bytes = file.size(),
            "upload accepted"
        );
        Ok(body.task_id)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot> {
        let url = self.task_endpoint("task", task_id).map_err(|e| {
            Error::TaskFailure(format!("Invalid status URL for task {}: {}", task_id, e))
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::TaskFailure(format!("Failed to check task status: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = service_error_message(response)
                .await
                .unwrap_or_else(|| status_code_message(status));
            return Err(Error::TaskFailure(message));
        }

        let snapshot: TaskSnapshot = response.json().await.map_err(|e| {
            Error::TaskFailure(format!("Malformed task status response: {}", e))
        })?;

        tracing::debug!(
            task_id = %task_id,
            status = %snapshot.status,
            progress = snapshot.progress,
            "task status received"
        );
        Ok(snapshot)
    }

    async fn fetch_artifact(&self, task_id: &TaskId, original_name: &str) -> Result<Artifact> {
        let fail = |detail: String| Error::Retrieval(format!("{RETRIEVAL_FAILURE_PREFIX}{detail}"));

        let url = self
            .task_endpoint("download", task_id)
            .map_err(|e| fail(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = service_error_message(response)
                .await
                .unwrap_or_else(|| status_code_message(status));
            tracing::warn!(task_id = %task_id, status = %status, error = %detail, "download rejected");
            return Err(fail(detail));
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        let filename = resolve_artifact_filename(content_disposition, original_name);

        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;

        tracing::info!(
            task_id = %task_id,
            filename = %filename,
            size_bytes = bytes.len(),
            "artifact downloaded"
        );
        Ok(Artifact::pdf(bytes.to_vec(), filename))
    }

    async fn cleanup(&self) -> Result<()> {
        let url = self
            .endpoint(CLEANUP_PATH)
            .map_err(|e| Error::Cleanup(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| Error::Cleanup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Cleanup(status_code_message(status)));
        }
        Ok(())
    }
}
