//! Multipart upload client for finished recordings.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;

const RECORDINGS_PATH: &str = "/api/recordings";
const RECORDING_MIME: &str = "video/webm";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unauthorized: token is invalid or expired")]
    Unauthorized,

    #[error("upload failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid credential: {0}")]
    InvalidToken(String),

    #[error("failed to build upload client: {0}")]
    Client(String),
}

impl UploadError {
    /// Whether the same submission may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// What the server answered to an accepted upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub status: u16,
    /// Parsed response body, `None` when it was not JSON.
    pub body: Option<serde_json::Value>,
}

/// Submits a recording to the backend.
pub trait RecordingUploader: Send + Sync {
    fn upload(&self, title: &str, data: &[u8]) -> Result<UploadReceipt, UploadError>;
}

/// Trim whitespace, strip trailing slashes and default to `https://`.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// [`RecordingUploader`] over HTTP with a bearer credential.
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(server_url: &str, token: &str) -> Result<Self, UploadError> {
        Self::with_timeout(server_url, token, UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, token: &str, timeout: Duration) -> Result<Self, UploadError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| UploadError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", normalize_url(server_url), RECORDINGS_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(title: &str, data: &[u8]) -> Result<Form, UploadError> {
        let recording = Part::bytes(data.to_vec())
            .file_name(format!("{}.webm", title))
            .mime_str(RECORDING_MIME)
            .map_err(|e| UploadError::Client(e.to_string()))?;
        Ok(Form::new()
            .part("recording", recording)
            .text("title", title.to_string())
            .text("size", data.len().to_string()))
    }
}

impl RecordingUploader for HttpUploader {
    fn upload(&self, title: &str, data: &[u8]) -> Result<UploadReceipt, UploadError> {
        log::info!("Uploading '{}' ({} bytes) to {}", title, data.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(title, data)?)
            .send()
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(UploadError::Unauthorized);
        }
        let body = response.text().map_err(|e| UploadError::Network(e.to_string()))?;
        if !status.is_success() {
            log::warn!("Upload rejected with HTTP {}", status.as_u16());
            return Err(UploadError::Http {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("Upload accepted with HTTP {}", status.as_u16());
        Ok(UploadReceipt {
            status: status.as_u16(),
            body: serde_json::from_str(&body).ok(),
        })
    }
}
