use std::sync::Arc;

use parking_lot::Mutex;

use crate::capability;
use crate::graph::MixGraph;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::media::{
    is_microphone_label, DisplayMediaRequest, EncodedChunk, EncoderOptions, EncoderState, SourceRole,
    UserMediaRequest,
};
use crate::models::notice::Notice;
use crate::models::recording_result::{RecordingArtifact, RecordingResult};
use crate::models::state::CaptureState;
use crate::models::stream::MediaStream;
use crate::session::ticker::ThreadTicker;
use crate::storage::preview::PreviewRegistry;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::encoder::{ChunkCallback, EncoderFactory, MediaEncoder};
use crate::traits::environment::RuntimeEnvironment;
use crate::traits::media_devices::MediaDevices;
use crate::traits::ticker::{TickHandle, Ticker};

/// Runtime facilities a session drives.
#[derive(Clone)]
pub struct CaptureRuntime {
    pub environment: Arc<dyn RuntimeEnvironment>,
    pub devices: Arc<dyn MediaDevices>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub ticker: Arc<dyn Ticker>,
    pub previews: Arc<PreviewRegistry>,
}

impl CaptureRuntime {
    /// Runtime with a thread-backed ticker and a fresh preview registry.
    pub fn new(
        environment: Arc<dyn RuntimeEnvironment>,
        devices: Arc<dyn MediaDevices>,
        encoders: Arc<dyn EncoderFactory>,
    ) -> Self {
        Self {
            environment,
            devices,
            encoders,
            ticker: Arc::new(ThreadTicker::new()),
            previews: Arc::new(PreviewRegistry::new()),
        }
    }

    pub fn with_ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    pub fn with_previews(mut self, previews: Arc<PreviewRegistry>) -> Self {
        self.previews = previews;
        self
    }
}

/// Delegate notifications, collected under the lock and delivered after it
/// is released.
enum Event {
    State(CaptureState),
    MicEnabled(bool),
    Notice(Notice),
    Error(CaptureError),
    Finished(RecordingResult),
    CloseRequested,
}

/// Resources owned by a running capture.
struct ActiveCapture {
    display: MediaStream,
    mic: Option<MediaStream>,
    graph: MixGraph,
    encoder: Box<dyn MediaEncoder>,
    chunks: Arc<Mutex<Vec<EncodedChunk>>>,
    tick: Option<(u64, TickHandle)>,
}

impl ActiveCapture {
    /// Apply the mute state through the mic gain node, or directly on the
    /// raw microphone tracks when no source is wired into the graph.
    fn apply_mic_enabled(&self, enabled: bool) {
        let wired = self.graph.has_source(SourceRole::Mic);
        self.graph.set_gain(SourceRole::Mic, gain_for(enabled));
        if !wired {
            if let Some(ref mic) = self.mic {
                set_mic_tracks_enabled(mic, enabled);
            }
        }
    }

    /// Best-effort release of everything the capture owns. Never fails.
    fn release(&mut self) {
        if let Some((_, tick)) = self.tick.take() {
            tick.cancel();
        }
        if self.encoder.state() != EncoderState::Inactive {
            if let Err(e) = self.encoder.stop() {
                log::error!("Failed to stop encoder: {}", e);
            }
        }
        self.display.stop_all();
        if let Some(mic) = self.mic.take() {
            mic.stop_all();
        }
        self.graph.close();
    }
}

struct Inner {
    state: CaptureState,
    /// Bumped whenever a capture starts or ends; continuations compare it.
    generation: u64,
    /// Bumped per hot-swap request; the latest request wins.
    switch_generation: u64,
    next_tick_id: u64,
    mic_enabled: bool,
    selected_mic: Option<String>,
    active: Option<ActiveCapture>,
}

struct Shared {
    config: CaptureConfiguration,
    runtime: CaptureRuntime,
    delegate: Mutex<Option<Arc<dyn CaptureDelegate>>>,
    inner: Mutex<Inner>,
}

/// Screen capture session: display plus optional system and microphone
/// audio, mixed into one track and encoded incrementally.
///
/// ```text
/// Idle → Starting → Recording ⇄ Paused
///                       ↓          ↓
///                    Stopping → Idle
/// ```
///
/// Acquisition calls run without the session lock held. When one returns,
/// its result is applied only if the session generation (and, for a hot-swap,
/// the switch generation) it started under is still current; otherwise the
/// freshly acquired stream is released.
#[derive(Clone)]
pub struct CaptureSession {
    shared: Arc<Shared>,
}

impl CaptureSession {
    pub fn new(config: CaptureConfiguration, runtime: CaptureRuntime) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                runtime,
                delegate: Mutex::new(None),
                inner: Mutex::new(Inner {
                    state: CaptureState::Idle,
                    generation: 0,
                    switch_generation: 0,
                    next_tick_id: 0,
                    mic_enabled: true,
                    selected_mic: None,
                    active: None,
                }),
            }),
        })
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.shared.delegate.lock() = Some(delegate);
    }

    pub fn configuration(&self) -> &CaptureConfiguration {
        &self.shared.config
    }

    pub fn previews(&self) -> Arc<PreviewRegistry> {
        Arc::clone(&self.shared.runtime.previews)
    }

    pub fn state(&self) -> CaptureState {
        self.shared.inner.lock().state
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.state().elapsed_secs()
    }

    pub fn is_mic_enabled(&self) -> bool {
        self.shared.inner.lock().mic_enabled
    }

    pub fn selected_microphone(&self) -> Option<String> {
        self.shared.inner.lock().selected_mic.clone()
    }

    /// Current gain of the microphone path in the mix graph, if wired.
    pub fn mic_gain(&self) -> Option<f32> {
        self.shared
            .inner
            .lock()
            .active
            .as_ref()
            .and_then(|active| active.graph.gain(SourceRole::Mic))
    }

    pub fn has_microphone(&self) -> bool {
        self.shared
            .inner
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| active.mic.is_some())
    }

    /// Begin a capture. `mic_device_id` overrides the current selection.
    ///
    /// Display acquisition failure aborts the start and returns the session to
    /// `Idle` with every acquired stream released. Microphone failure only
    /// raises a notice.
    pub fn start(&self, mic_device_id: Option<&str>) -> Result<(), CaptureError> {
        self.shared.start(mic_device_id)
    }

    pub fn pause(&self) -> Result<(), CaptureError> {
        self.shared.pause()
    }

    pub fn resume(&self) -> Result<(), CaptureError> {
        self.shared.resume()
    }

    /// Flip the microphone mute state and return the new value.
    pub fn toggle_mic(&self) -> bool {
        self.shared.toggle_mic()
    }

    /// Hot-swap the microphone without interrupting the encoder.
    ///
    /// While idle this only records the selection for the next start.
    pub fn switch_microphone(&self, device_id: &str) -> Result<(), CaptureError> {
        self.shared.switch_microphone(device_id)
    }

    /// Finish the capture and return the finalized recording, if any.
    /// Stopping an idle session is a no-op.
    ///
    /// The result's preview URL stays registered until the receiver passes
    /// it to [`PreviewRegistry::revoke`].
    pub fn stop(&self) -> Option<RecordingResult> {
        let (result, events) = {
            let mut inner = self.shared.inner.lock();
            self.shared.stop_locked(&mut inner)
        };
        self.shared.dispatch(events);
        result
    }

    /// Stop if needed, then ask the controls to hide.
    pub fn close(&self) -> Option<RecordingResult> {
        let result = self.stop();
        self.shared.dispatch(vec![Event::CloseRequested]);
        result
    }
}

fn gain_for(enabled: bool) -> f32 {
    if enabled {
        1.0
    } else {
        0.0
    }
}

/// Enable or silence the microphone tracks of a raw stream. When no track
/// label looks like a microphone, every audio track is affected.
fn set_mic_tracks_enabled(stream: &MediaStream, enabled: bool) {
    let audio = stream.audio_tracks();
    let identified: Vec<_> = audio
        .iter()
        .filter(|track| is_microphone_label(track.label()))
        .collect();
    let targets = if identified.is_empty() {
        audio.iter().collect()
    } else {
        identified
    };
    for track in targets {
        track.set_enabled(enabled);
    }
}

impl Shared {
    fn dispatch(&self, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }
        let Some(delegate) = self.delegate.lock().clone() else {
            return;
        };
        for event in events {
            match event {
                Event::State(state) => delegate.on_state_changed(&state),
                Event::MicEnabled(enabled) => delegate.on_mic_enabled_changed(enabled),
                Event::Notice(notice) => delegate.on_notice(&notice),
                Event::Error(error) => delegate.on_error(&error),
                Event::Finished(result) => delegate.on_capture_finished(&result),
                Event::CloseRequested => delegate.on_close_requested(),
            }
        }
    }

    fn start(self: &Arc<Self>, mic_device_id: Option<&str>) -> Result<(), CaptureError> {
        let report = capability::probe(self.runtime.environment.as_ref());
        if !report.can_record {
            log::warn!("Recording is not supported here: {}", report.advisory_message);
            self.dispatch(vec![Event::Notice(Notice::Unsupported(report.advisory_message.clone()))]);
            return Err(CaptureError::UnsupportedEnvironment(report.advisory_message));
        }

        let (generation, mic_device) = {
            let mut inner = self.inner.lock();
            if !inner.state.is_idle() {
                log::warn!("Start rejected: session is {}", inner.state.name());
                return Err(CaptureError::SessionActive);
            }
            if let Some(id) = mic_device_id {
                inner.selected_mic = Some(id.to_string());
            }
            inner.generation += 1;
            inner.state = CaptureState::Starting;
            (inner.generation, inner.selected_mic.clone())
        };
        log::info!("Starting capture (generation {})", generation);
        self.dispatch(vec![Event::State(CaptureState::Starting)]);

        match self.begin_capture(generation, mic_device) {
            Ok(()) => Ok(()),
            Err(CaptureError::Superseded) => {
                log::info!("Start of generation {} was superseded", generation);
                Err(CaptureError::Superseded)
            }
            Err(e) => {
                log::error!("Failed to start capture: {}", e);
                let reset = {
                    let mut inner = self.inner.lock();
                    let current = inner.generation == generation && inner.state == CaptureState::Starting;
                    if current {
                        inner.state = CaptureState::Idle;
                    }
                    current
                };
                if reset {
                    self.dispatch(vec![
                        Event::State(CaptureState::Idle),
                        Event::Notice(Notice::StartFailed),
                    ]);
                }
                Err(e)
            }
        }
    }

    /// Acquire, wire and start everything, then commit if still current.
    fn begin_capture(self: &Arc<Self>, generation: u64, mic_device: Option<String>) -> Result<(), CaptureError> {
        let request = DisplayMediaRequest {
            video: true,
            audio: self.config.capture_system_audio,
        };
        let display = self.runtime.devices.get_display_media(&request)?;
        log::info!(
            "Display capture acquired: {} video / {} audio track(s)",
            display.video_tracks().len(),
            display.audio_tracks().len()
        );

        let mut notices = Vec::new();
        let mic = self.acquire_microphone(mic_device.clone(), &mut notices);
        let mic_enabled = self.inner.lock().mic_enabled;

        let mut graph = MixGraph::new(self.config.sample_rate);
        if display.has_audio() {
            if let Err(e) = graph.connect(SourceRole::System, &display, 1.0) {
                log::warn!("Recording without system audio: {}", e);
                notices.push(Notice::AudioSourceOmitted(SourceRole::System));
            }
        }
        if let Some(ref mic) = mic {
            if let Err(e) = graph.connect(SourceRole::Mic, mic, gain_for(mic_enabled)) {
                log::warn!("Recording without microphone audio: {}", e);
                notices.push(Notice::AudioSourceOmitted(SourceRole::Mic));
            }
        }

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let encoder = self
            .create_encoder()
            .and_then(|mut encoder| {
                let sink = Arc::clone(&chunks);
                let on_data: ChunkCallback = Arc::new(move |chunk: EncodedChunk| {
                    if chunk.is_empty() {
                        return;
                    }
                    sink.lock().push(chunk);
                });
                encoder.start(graph.compose(&display), on_data)?;
                Ok(encoder)
            });
        let encoder = match encoder {
            Ok(encoder) => encoder,
            Err(e) => {
                display.stop_all();
                if let Some(ref mic) = mic {
                    mic.stop_all();
                }
                graph.close();
                return Err(e);
            }
        };
        log::info!("Encoder started ({})", encoder.mime_type());

        let mut active = ActiveCapture {
            display,
            mic,
            graph,
            encoder,
            chunks,
            tick: None,
        };

        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.state != CaptureState::Starting {
            drop(inner);
            log::info!("Capture generation {} is stale, releasing its streams", generation);
            active.release();
            return Err(CaptureError::Superseded);
        }

        // The mute state and the mic selection may have changed while acquiring.
        active.apply_mic_enabled(inner.mic_enabled);

        match self.start_tick(&mut inner, generation) {
            Ok(tick) => active.tick = Some(tick),
            Err(e) => {
                drop(inner);
                active.release();
                return Err(e);
            }
        }
        let reselect = match inner.selected_mic.clone() {
            Some(requested) if Some(&requested) != mic_device.as_ref() => {
                inner.selected_mic = mic_device.clone();
                Some(requested)
            }
            _ => None,
        };
        inner.active = Some(active);
        inner.state = CaptureState::Recording { elapsed_secs: 0 };
        drop(inner);
        log::info!("Recording");

        let mut events: Vec<Event> = notices.into_iter().map(Event::Notice).collect();
        events.push(Event::State(CaptureState::Recording { elapsed_secs: 0 }));
        self.dispatch(events);

        if let Some(device_id) = reselect {
            log::info!("Microphone '{}' was selected while starting", device_id);
            if let Err(e) = self.switch_microphone(&device_id) {
                log::warn!("Could not apply microphone selection '{}': {}", device_id, e);
            }
        }
        Ok(())
    }

    fn acquire_microphone(&self, device_id: Option<String>, notices: &mut Vec<Notice>) -> Option<MediaStream> {
        if !self.runtime.environment.supports_user_media() {
            log::warn!("Microphone capture is not available, recording without mic");
            notices.push(Notice::MicrophoneUnsupported);
            return None;
        }
        match self.runtime.devices.get_user_media(&UserMediaRequest { device_id }) {
            Ok(stream) => {
                log::info!("Microphone acquired ({} audio track(s))", stream.audio_tracks().len());
                Some(stream)
            }
            Err(e) => {
                log::warn!("Failed to capture microphone, recording without mic: {}", e);
                notices.push(Notice::MicrophoneUnavailable);
                None
            }
        }
    }

    /// Preferred MIME type first, then whatever the encoder defaults to.
    fn create_encoder(&self) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        let preferred = EncoderOptions {
            mime_type: Some(self.config.preferred_mime_type.clone()),
        };
        match self.runtime.encoders.create(&preferred) {
            Ok(encoder) => Ok(encoder),
            Err(e) => {
                log::warn!(
                    "Encoder rejected {} ({}), falling back to defaults",
                    self.config.preferred_mime_type,
                    e
                );
                self.runtime.encoders.create(&EncoderOptions::default())
            }
        }
    }

    fn start_tick(self: &Arc<Self>, inner: &mut Inner, generation: u64) -> Result<(u64, TickHandle), CaptureError> {
        inner.next_tick_id += 1;
        let tick_id = inner.next_tick_id;
        let session = Arc::downgrade(self);
        let handle = self.runtime.ticker.start(
            self.config.tick_interval,
            Box::new(move || {
                if let Some(shared) = session.upgrade() {
                    shared.on_tick(generation, tick_id);
                }
            }),
        )?;
        Ok((tick_id, handle))
    }

    fn on_tick(&self, generation: u64, tick_id: u64) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }
            let live_tick = inner
                .active
                .as_ref()
                .and_then(|active| active.tick.as_ref())
                .map(|(id, _)| *id);
            if live_tick != Some(tick_id) {
                return;
            }
            let CaptureState::Recording { elapsed_secs } = inner.state else {
                return;
            };

            let elapsed_secs = elapsed_secs + 1;
            inner.state = CaptureState::Recording { elapsed_secs };
            events.push(Event::State(inner.state));

            if elapsed_secs >= self.config.max_duration_secs {
                log::info!("Maximum duration of {}s reached, stopping", self.config.max_duration_secs);
                let (_, stop_events) = self.stop_locked(&mut inner);
                events.extend(stop_events);
            }
        }
        self.dispatch(events);
    }

    fn pause(&self) -> Result<(), CaptureError> {
        let state = {
            let mut inner = self.inner.lock();
            let CaptureState::Recording { elapsed_secs } = inner.state else {
                return Err(CaptureError::InvalidState(format!(
                    "cannot pause while {}",
                    inner.state.name()
                )));
            };
            let Some(active) = inner.active.as_mut() else {
                return Err(CaptureError::InvalidState("no active capture".into()));
            };
            if let Some((_, tick)) = active.tick.take() {
                tick.cancel();
            }
            if let Err(e) = active.encoder.pause() {
                log::warn!("Failed to pause encoder: {}", e);
            }
            inner.state = CaptureState::Paused { elapsed_secs };
            inner.state
        };
        log::info!("Paused at {}s", state.elapsed_secs());
        self.dispatch(vec![Event::State(state)]);
        Ok(())
    }

    fn resume(self: &Arc<Self>) -> Result<(), CaptureError> {
        let state = {
            let mut inner = self.inner.lock();
            let CaptureState::Paused { elapsed_secs } = inner.state else {
                return Err(CaptureError::InvalidState(format!(
                    "cannot resume while {}",
                    inner.state.name()
                )));
            };
            if inner.active.is_none() {
                return Err(CaptureError::InvalidState("no active capture".into()));
            }
            let generation = inner.generation;
            let mic_enabled = inner.mic_enabled;
            let tick = self.start_tick(&mut inner, generation)?;
            let Some(active) = inner.active.as_mut() else {
                return Err(CaptureError::InvalidState("no active capture".into()));
            };
            active.apply_mic_enabled(mic_enabled);
            if let Err(e) = active.encoder.resume() {
                log::warn!("Failed to resume encoder: {}", e);
            }
            active.tick = Some(tick);
            inner.state = CaptureState::Recording { elapsed_secs };
            inner.state
        };
        log::info!("Resumed at {}s", state.elapsed_secs());
        self.dispatch(vec![Event::State(state)]);
        Ok(())
    }

    fn toggle_mic(&self) -> bool {
        let enabled = {
            let mut inner = self.inner.lock();
            inner.mic_enabled = !inner.mic_enabled;
            let enabled = inner.mic_enabled;
            match inner.active.as_ref() {
                Some(active) if active.mic.is_some() => active.apply_mic_enabled(enabled),
                Some(_) => log::debug!("No microphone path to toggle"),
                None => {}
            }
            enabled
        };
        log::info!("Microphone {}", if enabled { "unmuted" } else { "muted" });
        self.dispatch(vec![Event::MicEnabled(enabled)]);
        enabled
    }

    fn switch_microphone(&self, device_id: &str) -> Result<(), CaptureError> {
        let (generation, ticket) = {
            let mut inner = self.inner.lock();
            if inner.selected_mic.as_deref() == Some(device_id) {
                log::debug!("Microphone '{}' is already selected", device_id);
                return Ok(());
            }
            if !inner.state.is_active() {
                log::debug!("Selected microphone '{}' for the next capture", device_id);
                inner.selected_mic = Some(device_id.to_string());
                return Ok(());
            }
            inner.switch_generation += 1;
            (inner.generation, inner.switch_generation)
        };
        log::info!("Switching microphone to '{}'", device_id);

        let stream = match self.runtime.devices.get_user_media(&UserMediaRequest::exact(device_id)) {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Failed to switch microphone to '{}': {}", device_id, e);
                self.dispatch(vec![Event::Notice(Notice::MicrophoneSwitchFailed)]);
                return Err(CaptureError::DeviceSwitchFailure(format!(
                    "{}; continuing with current mic",
                    e
                )));
            }
        };

        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock();
            let current = inner.generation == generation
                && inner.switch_generation == ticket
                && inner.state.is_active();
            if !current {
                drop(inner);
                log::info!("Microphone switch to '{}' was superseded", device_id);
                stream.stop_all();
                return Err(CaptureError::Superseded);
            }

            let mic_enabled = inner.mic_enabled;
            let Some(active) = inner.active.as_mut() else {
                drop(inner);
                stream.stop_all();
                return Err(CaptureError::Superseded);
            };
            if let Some(previous) = active.mic.replace(stream.clone()) {
                previous.stop_all();
            }
            if let Err(e) = active.graph.replace_source(SourceRole::Mic, &stream, gain_for(mic_enabled)) {
                log::warn!("New microphone could not be wired, recording without it: {}", e);
                events.push(Event::Notice(Notice::AudioSourceOmitted(SourceRole::Mic)));
            }
            active.apply_mic_enabled(mic_enabled);
            inner.selected_mic = Some(device_id.to_string());
        }
        log::info!("Switched microphone to '{}'", device_id);
        self.dispatch(events);
        Ok(())
    }

    /// Tear the capture down and finalize. Runs with the lock held and never
    /// calls the delegate.
    fn stop_locked(&self, inner: &mut Inner) -> (Option<RecordingResult>, Vec<Event>) {
        let mut events = Vec::new();
        let elapsed_secs = match inner.state {
            CaptureState::Idle | CaptureState::Stopping => return (None, events),
            CaptureState::Starting => {
                // The in-flight start sees the new generation and unwinds.
                log::info!("Stop requested while starting, cancelling");
                inner.generation += 1;
                inner.state = CaptureState::Idle;
                events.push(Event::State(CaptureState::Idle));
                return (None, events);
            }
            CaptureState::Recording { elapsed_secs } | CaptureState::Paused { elapsed_secs } => elapsed_secs,
        };

        inner.state = CaptureState::Stopping;
        events.push(Event::State(CaptureState::Stopping));

        let mut result = None;
        if let Some(mut active) = inner.active.take() {
            active.release();
            let chunks = std::mem::take(&mut *active.chunks.lock());
            match RecordingArtifact::assemble(chunks, &self.config.container_mime_type, elapsed_secs) {
                Some(artifact) => {
                    log::info!(
                        "Recording finalized: {} bytes in {} chunk(s), {}s",
                        artifact.size(),
                        artifact.chunk_count,
                        elapsed_secs
                    );
                    let artifact = Arc::new(artifact);
                    let preview_url = self.runtime.previews.create_url(Arc::clone(&artifact));
                    result = Some(RecordingResult { artifact, preview_url });
                }
                None => {
                    log::error!("Encoder produced no data, nothing to finalize");
                    events.push(Event::Error(CaptureError::EncodingFailed("no data was recorded".into())));
                }
            }
        }

        inner.generation += 1;
        inner.state = CaptureState::Idle;
        events.push(Event::State(CaptureState::Idle));
        if !inner.mic_enabled {
            inner.mic_enabled = true;
            events.push(Event::MicEnabled(true));
        }
        if let Some(ref result) = result {
            events.push(Event::Finished(result.clone()));
        }
        log::info!("Capture stopped");
        (result, events)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(mut active) = self.inner.get_mut().active.take() {
            log::warn!("Capture session dropped while active, releasing streams");
            active.release();
        }
    }
}
