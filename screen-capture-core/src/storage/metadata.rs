use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingArtifact, RecordingMetadata};

/// Write the artifact bytes to `path` with a JSON metadata sidecar next to
/// it. Returns the sidecar path.
pub fn write_recording(artifact: &RecordingArtifact, path: &Path) -> Result<PathBuf, CaptureError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::StorageError(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    fs::write(path, &artifact.data)
        .map_err(|e| CaptureError::StorageError(format!("failed to write recording: {}", e)))?;
    let sidecar = write_metadata(&artifact.metadata(), path)?;
    log::info!("Recording written to {} ({} bytes)", path.display(), artifact.size());
    Ok(sidecar)
}

/// Write recording metadata as a JSON sidecar file.
///
/// `clip.webm` gets `clip.metadata.json`.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let metadata_path = sidecar_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(metadata_path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(sidecar_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

pub fn sidecar_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}
