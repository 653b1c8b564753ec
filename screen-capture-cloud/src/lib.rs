//! # screen-capture-cloud
//!
//! Post-capture side of the recorder: client configuration, the multipart
//! upload client and the preview/export workflow around a finished
//! [`RecordingResult`](screen_capture_core::RecordingResult).

pub mod config;
pub mod export;
pub mod upload;

pub use config::{AppConfig, ConfigError};
pub use export::{ExportError, ExportSession, RefreshNotifier, SaveOutcome, UploadStatus};
pub use upload::{normalize_url, HttpUploader, RecordingUploader, UploadError, UploadReceipt};
