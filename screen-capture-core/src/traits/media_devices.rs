use crate::models::error::CaptureError;
use crate::models::media::{DisplayMediaRequest, MediaDeviceInfo, UserMediaRequest};
use crate::models::stream::MediaStream;

/// Device acquisition and enumeration provided by the runtime.
///
/// Acquisition calls may block on a user grant prompt. Implementations must
/// be callable from any thread; the session never holds its lock across them.
pub trait MediaDevices: Send + Sync {
    /// Acquire a display capture: video plus, when requested and granted,
    /// the system audio embedded in it.
    fn get_display_media(&self, request: &DisplayMediaRequest) -> Result<MediaStream, CaptureError>;

    /// Acquire a microphone capture.
    fn get_user_media(&self, request: &UserMediaRequest) -> Result<MediaStream, CaptureError>;

    /// List every device the runtime exposes, in enumeration order.
    fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CaptureError>;
}
