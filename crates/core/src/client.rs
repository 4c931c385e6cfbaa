//! HTTP transport for theme uploads

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Response returned by the server, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeResponse {
    pub status: u16,
    /// Body decoded as JSON, or the raw text as a JSON string when the
    /// server did not answer with JSON
    pub body: Value,
}

/// Sends a theme archive to the server.
///
/// Implementations return `Ok` for every response received, including
/// error statuses, and [`Error::Transport`] or [`Error::Timeout`] when no
/// response could be obtained.
#[async_trait]
pub trait ThemeTransport: Send + Sync {
    async fn post_theme(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<ThemeResponse>;
}

/// [`ThemeTransport`] over HTTP(S) with basic authentication
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Create a transport; requests block until the server answers unless a
    /// `timeout` is given.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("djupload/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ThemeTransport for HttpTransport {
    async fn post_theme(
        &self,
        url: &str,
        api_key: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<ThemeResponse> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("file", part);

        tracing::debug!(url, file_name, "posting theme");

        // multipart() sets Content-Length since every part has a known size
        let response = self
            .http_client
            .post(url)
            .basic_auth(api_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(ThemeResponse { status, body })
    }
}
