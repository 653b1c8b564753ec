use std::sync::Arc;

use crate::graph::mix_graph::MixDestination;
use crate::models::error::CaptureError;
use crate::models::media::{EncodedChunk, EncoderOptions, EncoderState};
use crate::traits::media_track::MediaTrack;

/// Sink for encoder output. Chunks must be delivered in production order.
pub type ChunkCallback = Arc<dyn Fn(EncodedChunk) + Send + Sync + 'static>;

/// The stream handed to the encoder.
///
/// Video comes straight from the display capture; audio can only come from
/// the mix graph's shared destination, never from a raw source stream.
#[derive(Clone)]
pub struct ComposedStream {
    pub video: Vec<Arc<dyn MediaTrack>>,
    pub audio: Arc<MixDestination>,
}

/// Incremental media encoder (WebM container, VP8 video, Opus audio).
pub trait MediaEncoder: Send {
    /// Container/codec description the encoder actually produces.
    fn mime_type(&self) -> &str;

    fn state(&self) -> EncoderState;

    /// Begin encoding `stream`, pushing output through `on_data`.
    fn start(&mut self, stream: ComposedStream, on_data: ChunkCallback) -> Result<(), CaptureError>;

    fn pause(&mut self) -> Result<(), CaptureError>;

    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stop encoding. Remaining data is flushed through `on_data` before
    /// this returns.
    fn stop(&mut self) -> Result<(), CaptureError>;
}

/// Creates one encoder per capture session.
pub trait EncoderFactory: Send + Sync {
    /// Fails when the requested options are not supported.
    fn create(&self, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError>;
}
