use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Kind of a device reported by enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
}

/// Raw device entry as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub label: String,
    pub group_id: String,
    pub kind: DeviceKind,
}

/// A microphone offered to the user, with its label normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    pub device_id: String,
    pub label: String,
    pub group_id: String,
}

/// Role of an audio source inside the mix graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    System,
    Mic,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Mic => write!(f, "microphone"),
        }
    }
}

/// Request for a display capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMediaRequest {
    pub video: bool,
    /// Ask for the system audio embedded in the display capture.
    pub audio: bool,
}

impl Default for DisplayMediaRequest {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Request for a microphone capture. `None` means the runtime default device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMediaRequest {
    pub device_id: Option<String>,
}

impl UserMediaRequest {
    pub fn exact(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
        }
    }
}

/// One piece of encoder output, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
}

impl EncodedChunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lifecycle of an incremental encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Inactive,
    Recording,
    Paused,
}

/// Options used to create an encoder. `mime_type: None` lets the encoder pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    pub mime_type: Option<String>,
}

/// Labels that identify a microphone track on a raw capture stream.
const MIC_LABEL_HINTS: [&str; 5] = ["microphone", "headset", "communications", "mic", "audio input"];

/// Heuristic microphone detection on a track label.
pub fn is_microphone_label(label: &str) -> bool {
    let label = label.to_lowercase();
    MIC_LABEL_HINTS.iter().any(|hint| label.contains(hint))
}
