use crate::models::error::CaptureError;
use crate::models::notice::Notice;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Methods are called from whichever thread drove the change (the caller of
/// a session operation, or the ticker thread), never while the session lock
/// is held. Implementations should marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes, including every elapsed tick.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when the microphone mute state flips.
    fn on_mic_enabled_changed(&self, enabled: bool);

    /// Called with advisory messages that do not abort capture.
    fn on_notice(&self, notice: &Notice);

    /// Called when an error occurs during capture.
    fn on_error(&self, error: &CaptureError);

    /// Called when capture completes and the artifact is finalized.
    fn on_capture_finished(&self, result: &RecordingResult);

    /// Called when the session is closed and the controls should hide.
    fn on_close_requested(&self);
}
