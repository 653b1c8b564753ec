//! Audio mixing graph.
//!
//! Combines the system audio of a display capture and a microphone into one
//! stereo destination track, with a runtime-adjustable gain per source:
//!
//! ```text
//! [system tracks] → SourceNode → GainNode ─┐
//!                                           ├→ MixDestination → encoder
//! [mic tracks]    → SourceNode → GainNode ─┘
//! ```
//!
//! A role's gain node outlives its source node, so swapping the microphone
//! keeps the configured mute state.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::media::SourceRole;
use crate::models::stream::MediaStream;
use crate::processing::mixer::{self, Resampler};
use crate::processing::sample_queue::SampleQueue;
use crate::traits::encoder::ComposedStream;
use crate::traits::media_track::{AudioBufferCallback, MediaTrack, SubscriptionId};

/// Seconds of audio each destination input can hold before dropping.
const INPUT_BUFFER_SECS: f64 = 5.0;

/// Output channel count of the destination.
pub const DESTINATION_CHANNELS: u16 = 2;

/// Per-source volume multiplier, shared with the audio thread.
#[derive(Debug, Clone)]
pub struct GainNode {
    bits: Arc<AtomicU32>,
}

impl GainNode {
    pub fn new(value: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::SeqCst))
    }

    pub fn set_value(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::SeqCst);
    }
}

struct DestinationInputs {
    system: SampleQueue,
    mic: SampleQueue,
}

impl DestinationInputs {
    fn queue_mut(&mut self, role: SourceRole) -> &mut SampleQueue {
        match role {
            SourceRole::System => &mut self.system,
            SourceRole::Mic => &mut self.mic,
        }
    }
}

/// Shared destination node. Its output is the only audio the encoder sees.
pub struct MixDestination {
    sample_rate: f64,
    inputs: Mutex<DestinationInputs>,
    closed: AtomicBool,
}

impl MixDestination {
    fn new(sample_rate: f64) -> Self {
        let capacity = (sample_rate * INPUT_BUFFER_SECS) as usize * DESTINATION_CHANNELS as usize;
        Self {
            sample_rate,
            inputs: Mutex::new(DestinationInputs {
                system: SampleQueue::new(capacity),
                mic: SampleQueue::new(capacity),
            }),
            closed: AtomicBool::new(false),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        DESTINATION_CHANNELS
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Frames buffered on the busiest input.
    #[cfg(test)]
    pub fn available_frames(&self) -> usize {
        let inputs = self.inputs.lock();
        inputs.system.len().max(inputs.mic.len()) / DESTINATION_CHANNELS as usize
    }

    /// Pull up to `frames` mixed stereo frames (interleaved).
    ///
    /// Inputs are summed with silence padding; an input with no data does not
    /// hold back the other.
    pub fn read(&self, frames: usize) -> Vec<f32> {
        let count = frames * DESTINATION_CHANNELS as usize;
        let mut inputs = self.inputs.lock();
        let system = inputs.system.pop(count);
        let mic = inputs.mic.pop(count);
        mixer::sum_clamped(&system, &mic)
    }

    fn push(&self, role: SourceRole, samples: &[f32]) {
        if self.is_closed() {
            return;
        }
        self.inputs.lock().queue_mut(role).push(samples);
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut inputs = self.inputs.lock();
            let dropped = inputs.system.dropped() + inputs.mic.dropped();
            if dropped > 0 {
                log::warn!("audio destination overflowed, {} samples dropped", dropped);
            }
            inputs.system.clear();
            inputs.mic.clear();
        }
    }
}

/// Subscription to the audio track feeding one role.
///
/// Only the first audio track of a stream is wired; further tracks would
/// otherwise be appended to the same input instead of mixed.
struct SourceNode {
    track: Arc<dyn MediaTrack>,
    subscription: Option<SubscriptionId>,
}

impl SourceNode {
    /// Subscribe to the first audio track of `stream`, feeding `gain` and
    /// then the destination input for `role`.
    fn connect(
        stream: &MediaStream,
        role: SourceRole,
        gain: &GainNode,
        destination: &Arc<MixDestination>,
    ) -> Result<Self, CaptureError> {
        let tracks = stream.audio_tracks();
        let Some(track) = tracks.first().cloned() else {
            return Err(CaptureError::GraphWiringFailure(format!(
                "stream '{}' has no audio tracks for the {} source",
                stream.id(),
                role
            )));
        };
        if tracks.len() > 1 {
            log::debug!(
                "stream '{}' has {} audio tracks, using '{}' for the {} source",
                stream.id(),
                tracks.len(),
                track.label(),
                role
            );
        }

        let resampler = Resampler::new(destination.sample_rate());
        let sink_gain = gain.clone();
        let sink = Arc::clone(destination);
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], rate: f64, channels: u16| {
            let stereo = mixer::to_stereo(samples, channels);
            let mut resampled = resampler.resample(&stereo, rate, DESTINATION_CHANNELS as usize);
            mixer::apply_gain(&mut resampled, sink_gain.value());
            sink.push(role, &resampled);
        });

        let subscription = track.subscribe(callback)?;
        Ok(Self {
            track,
            subscription: Some(subscription),
        })
    }

    fn disconnect(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.track.unsubscribe(id);
        }
    }
}

/// Source and gain wired for one role.
struct RoleChain {
    source: Option<SourceNode>,
    gain: GainNode,
}

/// The audio-processing context of one capture session.
///
/// Each role is either absent or a chain; there is at most one source node
/// per role.
pub struct MixGraph {
    destination: Arc<MixDestination>,
    system: Option<RoleChain>,
    mic: Option<RoleChain>,
    closed: bool,
}

impl MixGraph {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            destination: Arc::new(MixDestination::new(sample_rate)),
            system: None,
            mic: None,
            closed: false,
        }
    }

    pub fn destination(&self) -> Arc<MixDestination> {
        Arc::clone(&self.destination)
    }

    /// Video from the display capture, audio only from the destination.
    pub fn compose(&self, display: &MediaStream) -> ComposedStream {
        ComposedStream {
            video: display.video_tracks(),
            audio: self.destination(),
        }
    }

    /// Wire `stream` as the source for `role`.
    ///
    /// A role that is already wired is rewired instead, keeping its gain.
    pub fn connect(&mut self, role: SourceRole, stream: &MediaStream, initial_gain: f32) -> Result<(), CaptureError> {
        self.replace_source(role, stream, initial_gain)
    }

    /// Disconnect the role's current source (if any) and connect `stream` to
    /// the role's gain node. The gain node is created with `gain_if_new` when
    /// the role has none yet.
    pub fn replace_source(&mut self, role: SourceRole, stream: &MediaStream, gain_if_new: f32) -> Result<(), CaptureError> {
        if self.closed {
            return Err(CaptureError::InvalidState("audio graph is closed".into()));
        }

        let destination = Arc::clone(&self.destination);
        let chain = self.chain_mut(role);
        if let Some(mut old) = chain.as_mut().and_then(|c| c.source.take()) {
            log::debug!("disconnecting previous {} source", role);
            old.disconnect();
        }

        // The gain node is only created once a source connects to it.
        let gain = match chain.as_ref() {
            Some(existing) => existing.gain.clone(),
            None => GainNode::new(gain_if_new),
        };
        let source = SourceNode::connect(stream, role, &gain, &destination)?;
        log::info!("{} source '{}' connected (gain {})", role, stream.id(), gain.value());
        match chain {
            Some(existing) => existing.source = Some(source),
            None => {
                *chain = Some(RoleChain {
                    source: Some(source),
                    gain,
                })
            }
        }
        Ok(())
    }

    /// Disconnect the role's source, keeping its gain node.
    pub fn disconnect(&mut self, role: SourceRole) {
        if let Some(chain) = self.chain_mut(role).as_mut() {
            if let Some(mut source) = chain.source.take() {
                source.disconnect();
            }
        }
    }

    /// Set the gain of `role`. Returns `false` when the role has no gain node.
    pub fn set_gain(&self, role: SourceRole, value: f32) -> bool {
        match self.chain(role) {
            Some(chain) => {
                chain.gain.set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn gain(&self, role: SourceRole) -> Option<f32> {
        self.chain(role).map(|chain| chain.gain.value())
    }

    pub fn has_gain(&self, role: SourceRole) -> bool {
        self.chain(role).is_some()
    }

    pub fn has_source(&self, role: SourceRole) -> bool {
        self.chain(role).is_some_and(|chain| chain.source.is_some())
    }

    /// Tear down every node. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.disconnect(SourceRole::System);
        self.disconnect(SourceRole::Mic);
        self.system = None;
        self.mic = None;
        self.destination.close();
        self.closed = true;
        log::debug!("audio graph closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn chain(&self, role: SourceRole) -> Option<&RoleChain> {
        match role {
            SourceRole::System => self.system.as_ref(),
            SourceRole::Mic => self.mic.as_ref(),
        }
    }

    fn chain_mut(&mut self, role: SourceRole) -> &mut Option<RoleChain> {
        match role {
            SourceRole::System => &mut self.system,
            SourceRole::Mic => &mut self.mic,
        }
    }
}

impl Drop for MixGraph {
    fn drop(&mut self) {
        self.close();
    }
}
