use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::media::EncodedChunk;
use crate::storage::preview::PreviewUrl;

/// The finalized output of one capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingArtifact {
    pub id: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub duration_secs: u32,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
}

impl RecordingArtifact {
    /// Concatenate chunks in arrival order. Returns `None` when nothing
    /// was encoded.
    pub fn assemble(chunks: Vec<EncodedChunk>, mime_type: &str, duration_secs: u32) -> Option<Self> {
        if chunks.is_empty() {
            return None;
        }
        let chunk_count = chunks.len();
        let total: usize = chunks.iter().map(EncodedChunk::size).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }
        Some(Self::from_bytes(data, mime_type, duration_secs, chunk_count))
    }

    /// Wrap bytes that were already assembled (e.g. restored from storage).
    pub fn from_bytes(data: Vec<u8>, mime_type: &str, duration_secs: u32, chunk_count: usize) -> Self {
        let checksum = hex_encode(&Sha256::digest(&data));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data,
            mime_type: mime_type.to_string(),
            duration_secs,
            chunk_count,
            created_at: Utc::now(),
            checksum,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn metadata(&self) -> RecordingMetadata {
        RecordingMetadata {
            id: self.id.clone(),
            duration_secs: self.duration_secs,
            size_bytes: self.size(),
            mime_type: self.mime_type.clone(),
            chunk_count: self.chunk_count,
            checksum: self.checksum.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// What the session hands to the preview/export boundary on stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub artifact: Arc<RecordingArtifact>,
    pub preview_url: PreviewUrl,
}

/// Serializable description of an artifact, written next to downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: u32,
    pub size_bytes: u64,
    pub mime_type: String,
    pub chunk_count: usize,
    pub checksum: String,
    pub created_at: String,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
