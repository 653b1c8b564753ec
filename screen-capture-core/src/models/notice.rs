use std::fmt;

use super::media::SourceRole;

/// Advisory, non-blocking message surfaced to the controls.
///
/// A notice never aborts the operation that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Recording cannot start in this runtime; carries actionable guidance.
    Unsupported(String),
    /// The runtime cannot capture microphones at all.
    MicrophoneUnsupported,
    /// The microphone could not be acquired; capture continues without it.
    MicrophoneUnavailable,
    /// A hot-swap failed; the previous microphone stays wired.
    MicrophoneSwitchFailed,
    /// Display acquisition failed or was denied.
    StartFailed,
    /// Device enumeration is unavailable.
    DevicesUnsupported,
    /// One audio path could not be wired into the mix graph.
    AudioSourceOmitted(SourceRole),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(message) => {
                write!(f, "{} Please use Chrome for best experience.", message)
            }
            Self::MicrophoneUnsupported => {
                write!(f, "Microphone access not supported - recording without mic")
            }
            Self::MicrophoneUnavailable => {
                write!(f, "Failed to capture microphone - recording without mic")
            }
            Self::MicrophoneSwitchFailed => {
                write!(f, "Failed to switch microphone - continuing with current mic")
            }
            Self::StartFailed => write!(f, "Failed to start recording. Check permissions."),
            Self::DevicesUnsupported => write!(f, "Media devices not supported in this browser"),
            Self::AudioSourceOmitted(role) => {
                write!(f, "Could not capture {} audio - recording without it", role)
            }
        }
    }
}
