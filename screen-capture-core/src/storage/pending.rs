//! Single-slot store for a recording that finished while the user was
//! signed out. It survives the authentication round trip and is consumed
//! once afterwards.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::error::CaptureError;

/// Key of the one entry the store holds.
pub const PENDING_KEY: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecording {
    pub id: String,
    pub data: Vec<u8>,
    pub filename: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl PendingRecording {
    pub fn new(data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            id: PENDING_KEY.to_string(),
            data,
            filename: filename.into(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingEntry {
    id: String,
    filename: String,
    created_at: i64,
}

pub trait PendingRecordingStore: Send + Sync {
    /// Store `recording`, replacing any previous entry.
    fn save(&self, recording: &PendingRecording) -> Result<(), CaptureError>;

    fn load(&self) -> Result<Option<PendingRecording>, CaptureError>;

    /// Remove the entry. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<(), CaptureError>;

    /// Load and clear in one step.
    fn take(&self) -> Result<Option<PendingRecording>, CaptureError> {
        let recording = self.load()?;
        if recording.is_some() {
            self.clear()?;
        }
        Ok(recording)
    }
}

/// Keeps the entry as `latest.json` plus `latest.bin` in one directory.
pub struct FilePendingStore {
    dir: PathBuf,
}

impl FilePendingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", PENDING_KEY))
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(format!("{}.bin", PENDING_KEY))
    }
}

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> CaptureError {
    CaptureError::StorageError(format!("failed to {} {}: {}", action, path.display(), e))
}

fn remove_if_present(path: &Path) -> Result<(), CaptureError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_error("remove", path, e)),
    }
}

impl PendingRecordingStore for FilePendingStore {
    fn save(&self, recording: &PendingRecording) -> Result<(), CaptureError> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_error("create", &self.dir, e))?;

        let data_path = self.data_path();
        fs::write(&data_path, &recording.data).map_err(|e| storage_error("write", &data_path, e))?;

        let entry = PendingEntry {
            id: recording.id.clone(),
            filename: recording.filename.clone(),
            created_at: recording.created_at,
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| CaptureError::StorageError(format!("failed to serialize pending entry: {}", e)))?;
        let entry_path = self.entry_path();
        fs::write(&entry_path, json).map_err(|e| storage_error("write", &entry_path, e))?;

        log::info!("Saved pending recording '{}' ({} bytes)", recording.filename, recording.data.len());
        Ok(())
    }

    fn load(&self) -> Result<Option<PendingRecording>, CaptureError> {
        let entry_path = self.entry_path();
        let json = match fs::read_to_string(&entry_path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("read", &entry_path, e)),
        };
        let entry: PendingEntry = serde_json::from_str(&json)
            .map_err(|e| CaptureError::StorageError(format!("failed to parse pending entry: {}", e)))?;

        let data_path = self.data_path();
        let data = match fs::read(&data_path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Pending entry '{}' has no data, ignoring it", entry.filename);
                return Ok(None);
            }
            Err(e) => return Err(storage_error("read", &data_path, e)),
        };

        Ok(Some(PendingRecording {
            id: entry.id,
            data,
            filename: entry.filename,
            created_at: entry.created_at,
        }))
    }

    fn clear(&self) -> Result<(), CaptureError> {
        remove_if_present(&self.entry_path())?;
        remove_if_present(&self.data_path())?;
        log::debug!("Cleared pending recording store");
        Ok(())
    }
}
