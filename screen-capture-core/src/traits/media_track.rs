use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media::TrackKind;

/// Callback invoked when an audio buffer is available on a track.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of channels (1 = mono, 2 = stereo interleaved).
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Identifier returned by [`MediaTrack::subscribe`].
pub type SubscriptionId = u64;

/// A live audio or video track owned by a capture stream.
///
/// Implemented by the runtime backend (display capture, microphone capture).
/// Stopping a track releases the underlying device; stopping twice is a no-op.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    /// Human-readable label (device name for microphones).
    fn label(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Enable or silence the track without releasing it.
    fn set_enabled(&self, enabled: bool);

    /// Whether the track is still delivering (not stopped).
    fn is_live(&self) -> bool;

    /// Release the underlying device.
    fn stop(&self);

    /// Register a sink for audio buffers.
    ///
    /// The callback fires on the backend's audio thread. Video tracks and
    /// incompatible audio tracks fail with `GraphWiringFailure`.
    fn subscribe(&self, callback: AudioBufferCallback) -> Result<SubscriptionId, CaptureError>;

    /// Remove a sink registered with `subscribe`. Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);
}
