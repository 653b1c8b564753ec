/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → recording ↔ paused
///          ↓            ↓        ↓
///         idle       stopping → idle
/// ```
///
/// The elapsed time lives inside the states that track it, so a paused
/// session can never be "not recording".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Recording { elapsed_secs: u32 },
    Paused { elapsed_secs: u32 },
    Stopping,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Recording or paused: a live capture exists.
    pub fn is_active(&self) -> bool {
        self.is_recording() || self.is_paused()
    }

    /// Elapsed seconds; zero outside recording/paused.
    pub fn elapsed_secs(&self) -> u32 {
        match self {
            Self::Recording { elapsed_secs } | Self::Paused { elapsed_secs } => *elapsed_secs,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording { .. } => "recording",
            Self::Paused { .. } => "paused",
            Self::Stopping => "stopping",
        }
    }
}
