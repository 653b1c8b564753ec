//! Adapter between a live controls surface and a [`CaptureSession`].
//!
//! The surface sends [`ControlIntent`]s and renders [`ControlsView`]
//! snapshots; session notifications update the snapshot through the
//! delegate installed by [`RecordingControls::new`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::capability::{self, BrowserWarning};
use crate::devices::DeviceEnumerator;
use crate::export::validation::{format_duration, format_elapsed};
use crate::models::error::CaptureError;
use crate::models::media::AudioDevice;
use crate::models::notice::Notice;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::session::CaptureSession;
use crate::storage::preview::PreviewRegistry;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::environment::RuntimeEnvironment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlIntent {
    /// Start when idle, stop otherwise.
    ToggleRecording,
    /// Pause when recording, resume when paused.
    TogglePause,
    ToggleMic,
    ToggleMicMenu,
    SwitchMicrophone(String),
    Close,
}

/// Render snapshot of the controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsView {
    pub visible: bool,
    pub recording: bool,
    pub paused: bool,
    pub mic_enabled: bool,
    pub elapsed_secs: u32,
    pub elapsed_label: String,
    pub devices: Vec<AudioDevice>,
    pub selected_device: Option<String>,
    pub mic_menu_open: bool,
    /// Pulsing indicator: recording and not paused.
    pub live: bool,
    pub notice: Option<String>,
    pub warning: Option<BrowserWarning>,
}

#[derive(Default)]
struct ViewState {
    visible: bool,
    devices: Vec<AudioDevice>,
    mic_menu_open: bool,
    notice: Option<String>,
    last_result: Option<RecordingResult>,
}

/// Session delegate owned by the controls. Forwards everything to the
/// downstream delegate, if one is attached.
struct ControlsObserver {
    view: Mutex<ViewState>,
    downstream: Mutex<Option<Arc<dyn CaptureDelegate>>>,
    previews: Arc<PreviewRegistry>,
}

impl ControlsObserver {
    fn new(previews: Arc<PreviewRegistry>) -> Self {
        Self {
            view: Mutex::new(ViewState::default()),
            downstream: Mutex::new(None),
            previews,
        }
    }

    fn discard(&self, result: RecordingResult) {
        log::debug!("Discarding untaken recording {}", result.artifact.id);
        self.previews.revoke(&result.preview_url);
    }

    fn downstream(&self) -> Option<Arc<dyn CaptureDelegate>> {
        self.downstream.lock().clone()
    }
}

impl CaptureDelegate for ControlsObserver {
    fn on_state_changed(&self, state: &CaptureState) {
        if let Some(d) = self.downstream() {
            d.on_state_changed(state);
        }
    }

    fn on_mic_enabled_changed(&self, enabled: bool) {
        if let Some(d) = self.downstream() {
            d.on_mic_enabled_changed(enabled);
        }
    }

    fn on_notice(&self, notice: &Notice) {
        self.view.lock().notice = Some(notice.to_string());
        if let Some(d) = self.downstream() {
            d.on_notice(notice);
        }
    }

    fn on_error(&self, error: &CaptureError) {
        self.view.lock().notice = Some(error.to_string());
        if let Some(d) = self.downstream() {
            d.on_error(error);
        }
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        let replaced = self.view.lock().last_result.replace(result.clone());
        if let Some(stale) = replaced {
            self.discard(stale);
        }
        if let Some(d) = self.downstream() {
            d.on_capture_finished(result);
        }
    }

    fn on_close_requested(&self) {
        {
            let mut view = self.view.lock();
            view.visible = false;
            view.mic_menu_open = false;
        }
        if let Some(d) = self.downstream() {
            d.on_close_requested();
        }
    }
}

pub struct RecordingControls {
    session: CaptureSession,
    enumerator: DeviceEnumerator,
    environment: Arc<dyn RuntimeEnvironment>,
    observer: Arc<ControlsObserver>,
}

impl RecordingControls {
    /// Installs itself as the session's delegate.
    pub fn new(session: CaptureSession, enumerator: DeviceEnumerator, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        let observer = Arc::new(ControlsObserver::new(session.previews()));
        session.set_delegate(Arc::clone(&observer) as Arc<dyn CaptureDelegate>);
        Self {
            session,
            enumerator,
            environment,
            observer,
        }
    }

    /// Receive every session notification after the controls have seen it.
    pub fn set_downstream(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.observer.downstream.lock() = Some(delegate);
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Make the controls visible and refresh the microphone list. The first
    /// device becomes the selection unless one is already chosen.
    pub fn show(&self) -> Vec<AudioDevice> {
        let devices = match self.enumerator.list_microphones() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Error getting audio devices: {}", e);
                self.observer.on_notice(&Notice::DevicesUnsupported);
                Vec::new()
            }
        };

        if self.session.selected_microphone().is_none() {
            if let Some(first) = devices.first() {
                if let Err(e) = self.session.switch_microphone(&first.device_id) {
                    log::warn!("Failed to select default microphone: {}", e);
                }
            }
        }

        let mut view = self.observer.view.lock();
        view.visible = true;
        view.devices = devices.clone();
        devices
    }

    pub fn hide(&self) {
        let mut view = self.observer.view.lock();
        view.visible = false;
        view.mic_menu_open = false;
    }

    /// Apply one user intent. Stopping returns the finalized recording.
    pub fn handle(&self, intent: ControlIntent) -> Result<Option<RecordingResult>, CaptureError> {
        log::debug!("Control intent: {:?}", intent);
        match intent {
            ControlIntent::ToggleRecording => {
                if self.session.state().is_idle() {
                    self.observer.view.lock().notice = None;
                    self.session.start(None)?;
                    Ok(None)
                } else {
                    Ok(self.hand_over(self.session.stop()))
                }
            }
            ControlIntent::TogglePause => {
                match self.session.state() {
                    CaptureState::Recording { .. } => self.session.pause()?,
                    CaptureState::Paused { .. } => self.session.resume()?,
                    other => {
                        return Err(CaptureError::InvalidState(format!(
                            "cannot pause or resume while {}",
                            other.name()
                        )))
                    }
                }
                Ok(None)
            }
            ControlIntent::ToggleMic => {
                self.session.toggle_mic();
                Ok(None)
            }
            ControlIntent::ToggleMicMenu => {
                let mut view = self.observer.view.lock();
                view.mic_menu_open = !view.mic_menu_open;
                Ok(None)
            }
            ControlIntent::SwitchMicrophone(device_id) => {
                self.observer.view.lock().mic_menu_open = false;
                self.session.switch_microphone(&device_id)?;
                Ok(None)
            }
            ControlIntent::Close => Ok(self.hand_over(self.session.close())),
        }
    }

    /// A result returned from [`handle`](Self::handle) belongs to the caller
    /// and is no longer held for [`take_result`](Self::take_result).
    fn hand_over(&self, result: Option<RecordingResult>) -> Option<RecordingResult> {
        if result.is_some() {
            self.observer.view.lock().last_result = None;
        }
        result
    }

    /// The most recent finalized recording that was not returned by
    /// [`handle`](Self::handle), e.g. after the duration limit stopped the
    /// capture. Handed over once; the receiver owns its preview URL.
    ///
    /// An untaken result has its preview revoked when a newer recording
    /// finishes or the controls are dropped.
    pub fn take_result(&self) -> Option<RecordingResult> {
        self.observer.view.lock().last_result.take()
    }

    pub fn view(&self) -> ControlsView {
        let state = self.session.state();
        let elapsed_secs = state.elapsed_secs();
        let max = self.session.configuration().max_duration_secs;
        let warning = capability::probe(self.environment.as_ref()).browser_warning();
        let mic_enabled = self.session.is_mic_enabled();
        let selected_device = self.session.selected_microphone();

        let view = self.observer.view.lock();
        ControlsView {
            visible: view.visible,
            recording: state.is_active(),
            paused: state.is_paused(),
            mic_enabled,
            elapsed_secs,
            elapsed_label: format!("{} / {}", format_elapsed(elapsed_secs), format_duration(max)),
            devices: view.devices.clone(),
            selected_device,
            mic_menu_open: view.mic_menu_open,
            live: state.is_recording(),
            notice: view.notice.clone(),
            warning,
        }
    }
}

impl Drop for RecordingControls {
    fn drop(&mut self) {
        let untaken = self.observer.view.lock().last_result.take();
        if let Some(result) = untaken {
            self.observer.discard(result);
        }
    }
}
