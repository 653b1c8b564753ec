//! Post-capture review: filename, local download and upload hand-off.
//!
//! An [`ExportSession`] owns one finished recording and its preview URL. The
//! recording is kept across failed uploads so a save can be retried without
//! recording again. Without a credential the recording is parked in the
//! pending store and picked up again by [`ExportSession::restore_pending`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use screen_capture_core::export::generate_default_filename;
use screen_capture_core::storage::metadata::write_recording;
use screen_capture_core::{
    validate_recording, CaptureError, PendingRecording, PendingRecordingStore, PreviewRegistry, PreviewUrl,
    RecordingArtifact, RecordingResult,
};

use crate::config::ConfigError;
use crate::upload::{RecordingUploader, UploadError, UploadReceipt};

const RECORDING_MIME: &str = "video/webm";
const RECORDING_EXTENSION: &str = "webm";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Please enter a filename")]
    EmptyFilename,

    #[error("{}", .0.join(", "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] CaptureError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Uploaded(UploadReceipt),
    /// No credential; the recording was stored as pending.
    LoginRequired,
}

type RefreshListener = Arc<dyn Fn() + Send + Sync>;

/// Fan-out of "recordings changed" to listing surfaces.
#[derive(Default)]
pub struct RefreshNotifier {
    listeners: Mutex<Vec<RefreshListener>>,
}

impl RefreshNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Listeners run without the registry lock held, so they may subscribe.
    pub fn notify(&self) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }
}

pub struct ExportSession {
    artifact: Arc<RecordingArtifact>,
    preview_url: Option<PreviewUrl>,
    previews: Arc<PreviewRegistry>,
    pending: Arc<dyn PendingRecordingStore>,
    refresh: Arc<RefreshNotifier>,
    filename: String,
    status: UploadStatus,
    last_error: Option<String>,
}

impl ExportSession {
    /// `previews` must be the registry that issued `result.preview_url`.
    pub fn new(
        result: RecordingResult,
        previews: Arc<PreviewRegistry>,
        pending: Arc<dyn PendingRecordingStore>,
        refresh: Arc<RefreshNotifier>,
    ) -> Self {
        Self {
            artifact: result.artifact,
            preview_url: Some(result.preview_url),
            previews,
            pending,
            refresh,
            filename: generate_default_filename(),
            status: UploadStatus::Idle,
            last_error: None,
        }
    }

    /// Rebuild an export surface for a recording that came back from the
    /// pending store.
    pub fn from_pending(
        recording: PendingRecording,
        previews: Arc<PreviewRegistry>,
        pending: Arc<dyn PendingRecordingStore>,
        refresh: Arc<RefreshNotifier>,
    ) -> Self {
        let artifact = Arc::new(RecordingArtifact::from_bytes(recording.data, RECORDING_MIME, 0, 1));
        let preview_url = previews.create_url(Arc::clone(&artifact));
        let mut session = Self::new(
            RecordingResult { artifact, preview_url },
            previews,
            pending,
            refresh,
        );
        session.filename = recording.filename;
        session
    }

    /// Consume the pending entry, if any. A second call finds nothing.
    pub fn restore_pending(
        previews: Arc<PreviewRegistry>,
        pending: Arc<dyn PendingRecordingStore>,
        refresh: Arc<RefreshNotifier>,
    ) -> Result<Option<Self>, ExportError> {
        let Some(recording) = pending.take()? else {
            return Ok(None);
        };
        log::info!("Restored pending recording '{}'", recording.filename);
        Ok(Some(Self::from_pending(recording, previews, pending, refresh)))
    }

    pub fn artifact(&self) -> &Arc<RecordingArtifact> {
        &self.artifact
    }

    pub fn preview_url(&self) -> Option<&PreviewUrl> {
        self.preview_url.as_ref()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Write `<filename>.webm` and its metadata sidecar into `dir`.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let name = match self.filename.trim() {
            "" => generate_default_filename(),
            name => name.to_string(),
        };
        let path = dir.join(format!("{}.{}", name, RECORDING_EXTENSION));
        write_recording(&self.artifact, &path)?;
        Ok(path)
    }

    /// Validate and upload. `None` means no credential is available.
    pub fn save(&mut self, uploader: Option<&dyn RecordingUploader>) -> Result<SaveOutcome, ExportError> {
        let title = self.filename.trim().to_string();
        if title.is_empty() {
            return Err(self.fail(ExportError::EmptyFilename));
        }

        let Some(uploader) = uploader else {
            self.pending
                .save(&PendingRecording::new(self.artifact.data.clone(), title.clone()))?;
            log::info!("Not signed in; '{}' kept as pending", title);
            return Ok(SaveOutcome::LoginRequired);
        };

        let report = validate_recording(self.artifact.size(), self.artifact.duration_secs);
        if !report.is_valid() {
            return Err(self.fail(ExportError::Invalid(report.messages())));
        }

        self.status = UploadStatus::Uploading;
        self.last_error = None;
        match uploader.upload(&title, &self.artifact.data) {
            Ok(receipt) => {
                self.status = UploadStatus::Success;
                self.refresh.notify();
                Ok(SaveOutcome::Uploaded(receipt))
            }
            Err(e) => {
                log::warn!("Upload of '{}' failed: {}", title, e);
                Err(self.fail(e.into()))
            }
        }
    }

    /// Revoke the preview URL. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(url) = self.preview_url.take() {
            self.previews.revoke(&url);
        }
    }

    fn fail(&mut self, error: ExportError) -> ExportError {
        self.status = UploadStatus::Error;
        self.last_error = Some(error.to_string());
        error
    }
}

impl Drop for ExportSession {
    fn drop(&mut self) {
        self.close();
    }
}
