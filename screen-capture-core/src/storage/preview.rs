use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::models::recording_result::RecordingArtifact;

/// Scheme prefix of every preview locator.
pub const PREVIEW_SCHEME: &str = "blob:";

/// Locator of an in-memory artifact, valid until revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and revokes preview URLs for finished recordings.
///
/// A URL keeps its artifact alive until it is revoked; revoking twice is a
/// no-op.
#[derive(Default)]
pub struct PreviewRegistry {
    entries: Mutex<HashMap<PreviewUrl, Arc<RecordingArtifact>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_url(&self, artifact: Arc<RecordingArtifact>) -> PreviewUrl {
        let url = PreviewUrl(format!("{}{}", PREVIEW_SCHEME, uuid::Uuid::new_v4()));
        log::debug!("issued preview {} for recording {}", url, artifact.id);
        self.entries.lock().insert(url.clone(), artifact);
        url
    }

    pub fn resolve(&self, url: &PreviewUrl) -> Option<Arc<RecordingArtifact>> {
        self.entries.lock().get(url).cloned()
    }

    /// Returns whether the URL was still registered.
    pub fn revoke(&self, url: &PreviewUrl) -> bool {
        let removed = self.entries.lock().remove(url).is_some();
        if removed {
            log::debug!("revoked preview {}", url);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
