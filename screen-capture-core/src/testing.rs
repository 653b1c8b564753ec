//! In-memory runtime used by the unit tests: tracks, devices, encoder,
//! ticker and a delegate that records every callback.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::media::{
    DeviceKind, DisplayMediaRequest, EncodedChunk, EncoderOptions, EncoderState, MediaDeviceInfo,
    TrackKind, UserMediaRequest,
};
use crate::models::notice::Notice;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::models::stream::MediaStream;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::encoder::{ChunkCallback, ComposedStream, EncoderFactory, MediaEncoder};
use crate::traits::environment::RuntimeEnvironment;
use crate::traits::media_devices::MediaDevices;
use crate::traits::media_track::{AudioBufferCallback, MediaTrack, SubscriptionId};
use crate::traits::ticker::{TickCallback, TickHandle, Ticker};

static NEXT_TRACK: AtomicU64 = AtomicU64::new(1);

pub struct FakeTrack {
    id: String,
    label: String,
    kind: TrackKind,
    enabled: AtomicBool,
    live: AtomicBool,
    stops: AtomicUsize,
    reject: AtomicBool,
    next_subscription: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, AudioBufferCallback)>>,
}

impl FakeTrack {
    fn new(kind: TrackKind, label: &str) -> Arc<Self> {
        Arc::new(Self {
            id: format!("track-{}", NEXT_TRACK.fetch_add(1, Ordering::SeqCst)),
            label: label.to_string(),
            kind,
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(true),
            stops: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            next_subscription: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn audio(label: &str) -> Arc<Self> {
        Self::new(TrackKind::Audio, label)
    }

    pub fn video(label: &str) -> Arc<Self> {
        Self::new(TrackKind::Video, label)
    }

    /// Deliver a buffer to every subscriber, as the audio thread would.
    pub fn emit(&self, samples: &[f32], sample_rate: f64, channels: u16) {
        let subscribers: Vec<AudioBufferCallback> =
            self.subscribers.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in subscribers {
            callback(samples, sample_rate, channels);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn reject_subscriptions(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn subscribe(&self, callback: AudioBufferCallback) -> Result<SubscriptionId, CaptureError> {
        if self.kind != TrackKind::Audio || self.reject.load(Ordering::SeqCst) {
            return Err(CaptureError::GraphWiringFailure(format!(
                "track '{}' cannot feed an audio source",
                self.label
            )));
        }
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().push((id, callback));
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.subscribers.lock().retain(|(id, _)| *id != subscription);
    }
}

pub fn stream_of(id: &str, tracks: &[&Arc<FakeTrack>]) -> MediaStream {
    let tracks: Vec<Arc<dyn MediaTrack>> = tracks
        .iter()
        .map(|t| Arc::clone(*t) as Arc<dyn MediaTrack>)
        .collect();
    MediaStream::new(id, tracks)
}

type AcquireHook = Box<dyn Fn() + Send + Sync>;

/// Acquisition backend that hands out fake tracks and remembers them.
#[derive(Default)]
pub struct FakeDevices {
    pub display_error: Mutex<Option<CaptureError>>,
    pub display_without_audio: AtomicBool,
    pub mic_error: Mutex<Option<CaptureError>>,
    pub failing_mics: Mutex<HashSet<String>>,
    pub rejecting_mics: Mutex<HashSet<String>>,
    pub devices: Mutex<Vec<MediaDeviceInfo>>,
    pub enumerate_error: Mutex<Option<CaptureError>>,
    pub display_calls: AtomicUsize,
    pub mic_calls: AtomicUsize,
    pub display_tracks: Mutex<Vec<Arc<FakeTrack>>>,
    pub mic_tracks: Mutex<Vec<(Option<String>, Arc<FakeTrack>)>>,
    mic_labels: Mutex<HashMap<String, String>>,
    on_display: Mutex<Option<AcquireHook>>,
    on_mic: Mutex<HashMap<String, AcquireHook>>,
}

impl FakeDevices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `hook` while the display acquisition is in flight.
    pub fn during_display(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_display.lock() = Some(Box::new(hook));
    }

    /// Run `hook` while acquiring microphone `device_id`.
    pub fn during_mic(&self, device_id: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.on_mic.lock().insert(device_id.to_string(), Box::new(hook));
    }

    pub fn fail_display(&self, error: CaptureError) {
        *self.display_error.lock() = Some(error);
    }

    pub fn fail_mic(&self, error: CaptureError) {
        *self.mic_error.lock() = Some(error);
    }

    pub fn fail_mic_device(&self, device_id: &str) {
        self.failing_mics.lock().insert(device_id.to_string());
    }

    /// Microphone whose track cannot be wired into a mix graph.
    pub fn incompatible_mic(&self, device_id: &str) {
        self.rejecting_mics.lock().insert(device_id.to_string());
    }

    /// Track label reported by microphone `device_id`.
    pub fn label_mic(&self, device_id: &str, label: &str) {
        self.mic_labels.lock().insert(device_id.to_string(), label.to_string());
    }

    pub fn add_device(&self, device_id: &str, label: &str, kind: DeviceKind) {
        self.devices.lock().push(MediaDeviceInfo {
            device_id: device_id.to_string(),
            label: label.to_string(),
            group_id: format!("group-{}", device_id),
            kind,
        });
    }

    pub fn all_tracks(&self) -> Vec<Arc<FakeTrack>> {
        let mut tracks = self.display_tracks.lock().clone();
        tracks.extend(self.mic_tracks.lock().iter().map(|(_, t)| Arc::clone(t)));
        tracks
    }

    pub fn mic_track(&self, device_id: Option<&str>) -> Option<Arc<FakeTrack>> {
        self.mic_tracks
            .lock()
            .iter()
            .rev()
            .find(|(id, _)| id.as_deref() == device_id)
            .map(|(_, t)| Arc::clone(t))
    }

    pub fn system_audio_track(&self) -> Option<Arc<FakeTrack>> {
        self.display_tracks
            .lock()
            .iter()
            .rev()
            .find(|t| t.kind() == TrackKind::Audio)
            .cloned()
    }
}

impl MediaDevices for FakeDevices {
    fn get_display_media(&self, request: &DisplayMediaRequest) -> Result<MediaStream, CaptureError> {
        let call = self.display_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let hook = self.on_display.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        if let Some(error) = self.display_error.lock().clone() {
            return Err(error);
        }
        let screen = FakeTrack::video("Screen 1");
        let mut tracks = vec![Arc::clone(&screen)];
        if request.audio && !self.display_without_audio.load(Ordering::SeqCst) {
            tracks.push(FakeTrack::audio("System Audio"));
        }
        self.display_tracks.lock().extend(tracks.iter().cloned());
        let refs: Vec<&Arc<FakeTrack>> = tracks.iter().collect();
        Ok(stream_of(&format!("display-{}", call), &refs))
    }

    fn get_user_media(&self, request: &UserMediaRequest) -> Result<MediaStream, CaptureError> {
        let call = self.mic_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let key = request.device_id.clone().unwrap_or_default();
        let hook = self.on_mic.lock().remove(&key);
        if let Some(hook) = hook {
            hook();
        }
        if let Some(error) = self.mic_error.lock().clone() {
            return Err(error);
        }
        if self.failing_mics.lock().contains(&key) {
            return Err(CaptureError::AcquisitionFailed(format!("device '{}' is busy", key)));
        }
        let label = match request.device_id.as_deref() {
            Some(id) => self
                .mic_labels
                .lock()
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("Microphone ({})", id)),
            None => "Default Microphone".to_string(),
        };
        let track = FakeTrack::audio(&label);
        if self.rejecting_mics.lock().contains(&key) {
            track.reject_subscriptions();
        }
        self.mic_tracks
            .lock()
            .push((request.device_id.clone(), Arc::clone(&track)));
        Ok(stream_of(&format!("mic-{}", call), &[&track]))
    }

    fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CaptureError> {
        if let Some(error) = self.enumerate_error.lock().clone() {
            return Err(error);
        }
        Ok(self.devices.lock().clone())
    }
}

pub struct FakeEnvironment {
    pub user_agent: String,
    pub display_capture: bool,
    pub user_media: bool,
    pub media_encoder: bool,
    pub device_enumeration: bool,
}

pub const CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
pub const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0";
pub const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15";
pub const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0";

impl FakeEnvironment {
    pub fn chrome() -> Arc<Self> {
        Arc::new(Self::with_agent(CHROME_UA))
    }

    pub fn with_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            display_capture: true,
            user_media: true,
            media_encoder: true,
            device_enumeration: true,
        }
    }
}

impl RuntimeEnvironment for FakeEnvironment {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn supports_display_capture(&self) -> bool {
        self.display_capture
    }

    fn supports_user_media(&self) -> bool {
        self.user_media
    }

    fn supports_media_encoder(&self) -> bool {
        self.media_encoder
    }

    fn supports_device_enumeration(&self) -> bool {
        self.device_enumeration
    }
}

/// What the fake encoders observed.
#[derive(Default)]
pub struct EncoderLog {
    pub created: Vec<Option<String>>,
    pub events: Vec<&'static str>,
    pub stream: Option<ComposedStream>,
    callback: Option<ChunkCallback>,
}

#[derive(Default)]
pub struct FakeEncoderFactory {
    pub log: Arc<Mutex<EncoderLog>>,
    pub reject_preferred: AtomicBool,
    pub reject_all: AtomicBool,
    pub fail_start: AtomicBool,
    /// Bytes flushed by `stop`; empty means nothing is flushed.
    pub final_chunk: Mutex<Vec<u8>>,
}

impl FakeEncoderFactory {
    pub fn new() -> Arc<Self> {
        let factory = Self::default();
        *factory.final_chunk.lock() = b"tail".to_vec();
        Arc::new(factory)
    }

    /// Push a chunk through the running encoder's callback.
    pub fn emit(&self, data: &[u8]) {
        let callback = self.log.lock().callback.clone();
        if let Some(callback) = callback {
            callback(EncodedChunk::new(data.to_vec()));
        }
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.log.lock().events.clone()
    }

    pub fn created(&self) -> Vec<Option<String>> {
        self.log.lock().created.clone()
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn create(&self, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        let rejected = self.reject_all.load(Ordering::SeqCst)
            || (options.mime_type.is_some() && self.reject_preferred.load(Ordering::SeqCst));
        if rejected {
            return Err(CaptureError::EncodingFailed(format!(
                "unsupported options {:?}",
                options.mime_type
            )));
        }
        self.log.lock().created.push(options.mime_type.clone());
        Ok(Box::new(FakeEncoder {
            log: Arc::clone(&self.log),
            mime_type: options
                .mime_type
                .clone()
                .unwrap_or_else(|| "video/webm".to_string()),
            state: EncoderState::Inactive,
            fail_start: self.fail_start.load(Ordering::SeqCst),
            final_chunk: self.final_chunk.lock().clone(),
        }))
    }
}

pub struct FakeEncoder {
    log: Arc<Mutex<EncoderLog>>,
    mime_type: String,
    state: EncoderState,
    fail_start: bool,
    final_chunk: Vec<u8>,
}

impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn state(&self) -> EncoderState {
        self.state
    }

    fn start(&mut self, stream: ComposedStream, on_data: ChunkCallback) -> Result<(), CaptureError> {
        if self.fail_start {
            return Err(CaptureError::EncodingFailed("encoder refused to start".into()));
        }
        let mut log = self.log.lock();
        log.events.push("start");
        log.stream = Some(stream);
        log.callback = Some(on_data);
        self.state = EncoderState::Recording;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        self.log.lock().events.push("pause");
        self.state = EncoderState::Paused;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.log.lock().events.push("resume");
        self.state = EncoderState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let callback = {
            let mut log = self.log.lock();
            log.events.push("stop");
            log.callback.take()
        };
        self.state = EncoderState::Inactive;
        if let Some(callback) = callback {
            callback(EncodedChunk::new(self.final_chunk.clone()));
        }
        Ok(())
    }
}

type SharedTick = (Arc<AtomicBool>, Duration, Arc<Mutex<TickCallback>>);

/// Ticker driven by the test instead of a clock.
#[derive(Default)]
pub struct ManualTicker {
    ticks: Mutex<Vec<SharedTick>>,
}

impl ManualTicker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fire every active tick `count` times.
    pub fn advance(&self, count: u32) {
        for _ in 0..count {
            let ticks: Vec<SharedTick> = self.ticks.lock().clone();
            for (active, _, callback) in ticks {
                if active.load(Ordering::SeqCst) {
                    let mut on_tick = callback.lock();
                    (*on_tick)();
                }
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.ticks
            .lock()
            .iter()
            .filter(|(active, _, _)| active.load(Ordering::SeqCst))
            .count()
    }

    pub fn started(&self) -> usize {
        self.ticks.lock().len()
    }
}

impl Ticker for ManualTicker {
    fn start(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle, CaptureError> {
        let active = Arc::new(AtomicBool::new(true));
        self.ticks
            .lock()
            .push((Arc::clone(&active), period, Arc::new(Mutex::new(on_tick))));
        Ok(TickHandle::new(active))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    State(CaptureState),
    MicEnabled(bool),
    Notice(Notice),
    Error(CaptureError),
    Finished(RecordingResult),
    CloseRequested,
}

#[derive(Default)]
pub struct RecordingDelegate {
    pub events: Mutex<Vec<DelegateEvent>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<CaptureState> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::Error(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<RecordingResult> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DelegateEvent::Finished(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &DelegateEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == wanted).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.events.lock().push(DelegateEvent::State(*state));
    }

    fn on_mic_enabled_changed(&self, enabled: bool) {
        self.events.lock().push(DelegateEvent::MicEnabled(enabled));
    }

    fn on_notice(&self, notice: &Notice) {
        self.events.lock().push(DelegateEvent::Notice(notice.clone()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.events.lock().push(DelegateEvent::Error(error.clone()));
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.events.lock().push(DelegateEvent::Finished(result.clone()));
    }

    fn on_close_requested(&self) {
        self.events.lock().push(DelegateEvent::CloseRequested);
    }
}
