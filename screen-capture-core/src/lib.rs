//! # screen-capture-core
//!
//! Platform-agnostic screen capture core library.
//!
//! Captures a display stream plus optional system and microphone audio,
//! mixes the audio into one gain-controlled track, encodes incrementally and
//! enforces a hard duration cap. Runtime backends (display capture,
//! microphone capture, media encoding) implement the traits in [`traits`]
//! and plug into [`CaptureSession`].
//!
//! ## Architecture
//!
//! ```text
//! screen-capture-core (this crate)
//! ├── traits/       ← MediaDevices, MediaTrack, MediaEncoder, Ticker, CaptureDelegate, RuntimeEnvironment
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, MediaStream, RecordingArtifact, Notice
//! ├── capability/   ← runtime capability probe and advisory messages
//! ├── devices/      ← microphone enumeration, label normalization and dedup
//! ├── graph/        ← MixGraph (per-role source + gain into one destination)
//! ├── processing/   ← resampling, channel conversion, sample queues
//! ├── session/      ← CaptureSession state machine, thread ticker
//! ├── export/       ← artifact validation and display formatters
//! ├── storage/      ← preview URLs, pending-recording store, metadata sidecars
//! └── controls      ← adapter for a live controls surface
//! ```

pub mod capability;
pub mod controls;
pub mod devices;
pub mod export;
pub mod graph;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use capability::{probe, BrowserFamily, BrowserWarning, CapabilityReport, WarningLevel};
pub use controls::{ControlIntent, ControlsView, RecordingControls};
pub use devices::{normalize_label, DeviceEnumerator};
pub use export::validation::{validate_recording, ValidationError, ValidationReport, MAX_ARTIFACT_BYTES, MIN_ARTIFACT_BYTES};
pub use graph::{GainNode, MixDestination, MixGraph};
pub use models::config::{CaptureConfiguration, MAX_CAPTURE_DURATION_SECS};
pub use models::error::CaptureError;
pub use models::media::{AudioDevice, DeviceKind, EncodedChunk, MediaDeviceInfo, SourceRole, TrackKind};
pub use models::notice::Notice;
pub use models::recording_result::{RecordingArtifact, RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use models::stream::MediaStream;
pub use session::{CaptureRuntime, CaptureSession, ThreadTicker};
pub use storage::pending::{FilePendingStore, PendingRecording, PendingRecordingStore};
pub use storage::preview::{PreviewRegistry, PreviewUrl};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::encoder::{ComposedStream, EncoderFactory, MediaEncoder};
pub use traits::environment::RuntimeEnvironment;
pub use traits::media_devices::MediaDevices;
pub use traits::media_track::{AudioBufferCallback, MediaTrack};
pub use traits::ticker::{TickHandle, Ticker};
