//! Theme upload workflow

use crate::archive::{classify, package, Payload};
use crate::client::ThemeTransport;
use crate::error::Result;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything needed to upload a theme for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// A single archive, or one or more directories
    pub paths: Vec<PathBuf>,
    /// Directory the archive content is nested under, usually the project name
    pub prefix: Option<String>,
    pub base_url: String,
    pub api_key: String,
}

impl UploadRequest {
    /// Endpoint themes are posted to
    pub fn themes_url(&self) -> String {
        format!("{}/api/themes", self.base_url.trim_end_matches('/'))
    }
}

/// How an upload attempt ended. Error statuses from the server are a
/// regular outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Response {
        url: String,
        status: u16,
        body: Value,
    },
    TransportFailed {
        url: String,
        message: String,
    },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Response { status, .. } if (200..300).contains(status))
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Response { url, status, body } => {
                write!(f, "POST {} returns {} {}", url, status, body)
            }
            UploadOutcome::TransportFailed { message, .. } => write!(f, "error: {}", message),
        }
    }
}

/// Classify `request.paths`, build the archive if needed and post it.
pub async fn upload(
    request: &UploadRequest,
    cwd: &Path,
    transport: &dyn ThemeTransport,
) -> Result<UploadOutcome> {
    let payload = classify(&request.paths, cwd)?;
    upload_payload(request, &payload, cwd, transport).await
}

/// Post an already classified payload.
pub async fn upload_payload(
    request: &UploadRequest,
    payload: &Payload,
    cwd: &Path,
    transport: &dyn ThemeTransport,
) -> Result<UploadOutcome> {
    let archive = package(payload, request.prefix.as_deref(), cwd)?;
    let content = tokio::fs::read(archive.path()).await?;
    let url = request.themes_url();

    tracing::info!(
        url = %url,
        archive = archive.file_name(),
        bytes = content.len(),
        "uploading theme"
    );

    match transport
        .post_theme(&url, &request.api_key, archive.file_name(), content)
        .await
    {
        Ok(response) => Ok(UploadOutcome::Response {
            url,
            status: response.status,
            body: response.body,
        }),
        Err(err) if err.is_transport() => {
            tracing::debug!(url = %url, error = %err, "no response from server");
            Ok(UploadOutcome::TransportFailed {
                url,
                message: err.to_string(),
            })
        }
        Err(err) => Err(err),
    }
}
