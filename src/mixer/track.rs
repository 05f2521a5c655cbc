//! A single track slot owned by the [`crate::mixer::Mixer`]: a PCM source
//! plus its volume/pause controls and the callback to fire when the source
//! is exhausted.

use super::volume::TrackControls;
use crate::source::PcmSource;

/// Invoked with the track's id once its source is exhausted and it has been
/// swept out of the mixer's map. Always run outside the mixer's lock (see
/// [`crate::mixer::Mixer::stream`]).
pub type OnEnd = Box<dyn FnOnce(&str) + Send + 'static>;

pub struct TrackSlot {
    pub(super) source: Box<dyn PcmSource>,
    pub(super) controls: TrackControls,
    pub(super) on_end: Option<OnEnd>,
}

impl TrackSlot {
    pub fn new(source: Box<dyn PcmSource>, initial_volume_db: f64, on_end: Option<OnEnd>) -> Self {
        Self {
            source,
            controls: TrackControls::new(initial_volume_db),
            on_end,
        }
    }

    pub fn controls(&self) -> &TrackControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut TrackControls {
        &mut self.controls
    }
}

/// A track that reached end-of-stream during a [`crate::mixer::Mixer::stream`]
/// call. Carries everything the caller needs to finish tearing it down
/// (closing the source, invoking `on_end`) on a separate task, without the
/// mixer holding its lock across that work.
pub struct EndedTrack {
    pub id: String,
    pub source: Box<dyn PcmSource>,
    pub on_end: Option<OnEnd>,
}
