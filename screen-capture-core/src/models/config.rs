use std::time::Duration;

/// Hard cap on a single capture, in seconds.
pub const MAX_CAPTURE_DURATION_SECS: u32 = 180;

/// Encoder format requested first; the encoder default is used if rejected.
pub const PREFERRED_MIME_TYPE: &str = "video/webm;codecs=vp8,opus";

/// Container type of the finalized artifact.
pub const CONTAINER_MIME_TYPE: &str = "video/webm";

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// Automatic stop threshold in seconds (default: 180).
    pub max_duration_secs: u32,

    /// Period of the elapsed-time tick (default: 1 second).
    pub tick_interval: Duration,

    /// Encoder MIME type tried first.
    pub preferred_mime_type: String,

    /// MIME type stamped on the finalized artifact.
    pub container_mime_type: String,

    /// Sample rate of the mix graph destination in Hz (default: 48000).
    pub sample_rate: f64,

    /// Request system audio alongside the display capture (default: true).
    pub capture_system_audio: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_duration_secs == 0 {
            return Err("max duration must be positive".into());
        }
        if self.tick_interval.is_zero() {
            return Err("tick interval must be positive".into());
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            max_duration_secs: MAX_CAPTURE_DURATION_SECS,
            tick_interval: Duration::from_secs(1),
            preferred_mime_type: PREFERRED_MIME_TYPE.into(),
            container_mime_type: CONTAINER_MIME_TYPE.into(),
            sample_rate: 48000.0,
            capture_system_audio: true,
        }
    }
}
