use std::fmt;
use std::sync::Arc;

use crate::models::media::TrackKind;
use crate::traits::media_track::MediaTrack;

/// An owned set of tracks returned by one acquisition call.
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Audio)
    }

    /// Stop every live track. Already-stopped tracks are left alone.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            if track.is_live() {
                log::debug!("stopping {:?} track '{}'", track.kind(), track.label());
                track.stop();
            }
        }
    }

    fn tracks_of(&self, kind: TrackKind) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stream_of, FakeTrack};

    #[test]
    fn splits_tracks_by_kind() {
        let screen = FakeTrack::video("screen");
        let system = FakeTrack::audio("system");
        let tab = FakeTrack::audio("tab");
        let stream = stream_of("display", &[&screen, &system, &tab]);

        assert_eq!(stream.id(), "display");
        assert_eq!(stream.video_tracks().len(), 1);
        assert_eq!(stream.audio_tracks().len(), 2);
        assert!(stream.has_audio());
    }

    #[test]
    fn stop_all_skips_stopped_tracks() {
        let video = FakeTrack::video("screen");
        let audio = FakeTrack::audio("system");
        audio.stop();
        let stream = stream_of("display", &[&video, &audio]);

        stream.stop_all();
        stream.stop_all();

        assert_eq!(video.stop_count(), 1);
        assert_eq!(audio.stop_count(), 1);
    }
}
