//! The mixer ("disc jockey"): owns a set of named tracks and sums their
//! output per sample. Grounded on `songbird`'s mixing driver
//! (`driver/tasks/mixer`), scaled down from symphonia-based per-frame
//! decoding to the simpler `PcmSource` contract this crate's sources
//! satisfy.

pub mod resample;
pub mod track;
pub mod volume;

use crate::constants::SAMPLE_RATE;
use crate::error::MixerError;
use crate::source::{AudioFormat, PcmSource};
use parking_lot::Mutex;
use resample::ResamplingSource;
use std::collections::HashMap;
use track::{EndedTrack, OnEnd, TrackSlot};

/// Additive stereo mixer over a set of named PCM tracks. Always produces a
/// full, silence-padded buffer on `stream` — it never blocks and never
/// returns a short read.
pub struct Mixer {
    tracks: Mutex<HashMap<String, TrackSlot>>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            tracks: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a new track under `id`. Resamples to [`SAMPLE_RATE`] first
    /// if `format.sample_rate` differs (a reported rate of `0` is treated as
    /// already-canonical, with a warning).
    pub fn add(
        &self,
        id: impl Into<String>,
        source: Box<dyn PcmSource>,
        format: AudioFormat,
        initial_volume_db: f64,
        on_end: Option<OnEnd>,
    ) -> Result<(), MixerError> {
        let id = id.into();
        let mut tracks = self.tracks.lock();
        if tracks.contains_key(&id) {
            return Err(MixerError::AlreadyExists(id));
        }

        let source: Box<dyn PcmSource> = if format.sample_rate == 0 {
            tracing::warn!(track = %id, "source reported sample rate 0, assuming canonical rate");
            source
        } else if format.sample_rate != SAMPLE_RATE {
            Box::new(ResamplingSource::new(source, format.sample_rate))
        } else {
            source
        };

        tracks.insert(id, TrackSlot::new(source, initial_volume_db, on_end));
        Ok(())
    }

    /// Removes and closes a track immediately. Unlike end-of-stream removal
    /// during `stream`, this is an explicit caller-driven operation and may
    /// close the source inline.
    pub fn remove(&self, id: &str) -> Result<(), MixerError> {
        let mut slot = self
            .tracks
            .lock()
            .remove(id)
            .ok_or_else(|| MixerError::NotFound(id.to_string()))?;
        if let Err(e) = slot.source.close() {
            tracing::warn!(track = id, error = %e, "error closing track on removal");
        }
        Ok(())
    }

    /// Closes every track and empties the set.
    pub fn close_all(&self) {
        let mut tracks = self.tracks.lock();
        for (id, mut slot) in tracks.drain() {
            if let Err(e) = slot.source.close() {
                tracing::warn!(track = id, error = %e, "error closing track on close_all");
            }
        }
    }

    pub fn set_paused(&self, id: &str, paused: bool) -> Result<(), MixerError> {
        let mut tracks = self.tracks.lock();
        let slot = tracks
            .get_mut(id)
            .ok_or_else(|| MixerError::NotFound(id.to_string()))?;
        if slot.controls().paused() == paused {
            tracing::warn!(track = id, paused, "track already in requested pause state");
        }
        slot.controls_mut().set_paused(paused);
        Ok(())
    }

    pub fn change_volume(&self, id: &str, delta_db: f64) -> Result<(), MixerError> {
        let mut tracks = self.tracks.lock();
        let slot = tracks
            .get_mut(id)
            .ok_or_else(|| MixerError::NotFound(id.to_string()))?;
        slot.controls_mut().change_volume(delta_db);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.lock().contains_key(id)
    }

    /// Fills `buf` with the sum of all active, non-silent, non-paused
    /// tracks, in place. Always fills the entire buffer (silence-padded).
    /// Returns the tracks that hit end-of-stream this call; the caller
    /// closes them and invokes their `on_end` hooks on a separate task —
    /// this method never does I/O or runs user callbacks while holding the
    /// mixer lock.
    pub fn stream(&self, buf: &mut [[i16; 2]]) -> Vec<EndedTrack> {
        for frame in buf.iter_mut() {
            *frame = [0, 0];
        }

        let mut ended = Vec::new();
        let mut scratch = vec![[0i16; 2]; buf.len()];
        let mut tracks = self.tracks.lock();
        let ids: Vec<String> = tracks.keys().cloned().collect();

        for id in ids {
            let slot = tracks.get_mut(&id).expect("id taken from this map");
            if slot.controls().paused() {
                continue;
            }

            let n = slot.source.read_frames(&mut scratch);
            if !slot.controls().silent() {
                let gain = slot.controls().gain();
                for i in 0..n {
                    mix_sample(&mut buf[i], scratch[i], gain);
                }
            }

            if n < scratch.len() {
                let slot = tracks.remove(&id).expect("id taken from this map");
                ended.push(EndedTrack {
                    id,
                    source: slot.source,
                    on_end: slot.on_end,
                });
            }
        }

        ended
    }
}

/// Closes each ended track's source and invokes its `on_end` hook on a task
/// of its own. The encoder's pull loop calls this with whatever `stream`
/// just swept out; never run this work inline, since the mixer's lock may
/// still be held by the caller at that point (spec §4.1/§9).
pub fn dispatch_ended(ended: Vec<EndedTrack>) {
    for mut track in ended {
        tokio::spawn(async move {
            if let Err(e) = track.source.close() {
                tracing::warn!(track = %track.id, error = %e, "error closing ended track");
            }
            if let Some(on_end) = track.on_end.take() {
                on_end(&track.id);
            }
        });
    }
}

fn mix_sample(dst: &mut [i16; 2], src: [i16; 2], gain: f64) {
    for ch in 0..2 {
        let sum = dst[ch] as f64 + src[ch] as f64 * gain;
        dst[ch] = sum.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::sine::SineSource;

    fn fmt() -> AudioFormat {
        AudioFormat::default()
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mixer = Mixer::new();
        mixer
            .add("a", Box::new(SineSource::new(SAMPLE_RATE, 440.0, 1.0)), fmt(), 0.0, None)
            .unwrap();
        let err = mixer
            .add("a", Box::new(SineSource::new(SAMPLE_RATE, 440.0, 1.0)), fmt(), 0.0, None)
            .unwrap_err();
        assert!(matches!(err, MixerError::AlreadyExists(id) if id == "a"));
    }

    #[test]
    fn stream_always_fills_buffer_with_no_tracks() {
        let mixer = Mixer::new();
        let mut buf = vec![[1i16, 1i16]; 100];
        let ended = mixer.stream(&mut buf);
        assert!(ended.is_empty());
        assert!(buf.iter().all(|&f| f == [0, 0]));
    }

    #[test]
    fn end_of_track_is_reported_once_and_fires_callback() {
        let mixer = Mixer::new();
        let fired = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let fired2 = fired.clone();
        mixer
            .add(
                "a",
                Box::new(SineSource::new(SAMPLE_RATE, 440.0, 0.01)),
                fmt(),
                0.0,
                Some(Box::new(move |_id: &str| {
                    fired2.store(true, std::sync::atomic::Ordering::SeqCst);
                })),
            )
            .unwrap();

        let mut buf = vec![[0i16, 0i16]; SAMPLE_RATE as usize];
        let ended = mixer.stream(&mut buf);
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].id, "a");
        assert!(!mixer.contains("a"));

        (ended.into_iter().next().unwrap().on_end.unwrap())("a");
        assert!(fired.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn silent_track_contributes_nothing() {
        let mixer = Mixer::new();
        mixer
            .add("a", Box::new(SineSource::new(SAMPLE_RATE, 440.0, 1.0)), fmt(), -60.0, None)
            .unwrap();
        let mut buf = vec![[0i16, 0i16]; 10];
        mixer.stream(&mut buf);
        assert!(buf.iter().all(|&f| f == [0, 0]));
    }

    #[test]
    fn paused_track_is_skipped_but_not_removed() {
        let mixer = Mixer::new();
        mixer
            .add("a", Box::new(SineSource::new(SAMPLE_RATE, 440.0, 1.0)), fmt(), 0.0, None)
            .unwrap();
        mixer.set_paused("a", true).unwrap();
        let mut buf = vec![[0i16, 0i16]; 10];
        let ended = mixer.stream(&mut buf);
        assert!(ended.is_empty());
        assert!(mixer.contains("a"));
        assert!(buf.iter().all(|&f| f == [0, 0]));
    }

    #[test]
    fn change_volume_updates_silent_flag() {
        let mixer = Mixer::new();
        mixer
            .add("a", Box::new(SineSource::new(SAMPLE_RATE, 440.0, 1.0)), fmt(), 0.0, None)
            .unwrap();
        mixer.change_volume("a", -60.0).unwrap();
        let mut buf = vec![[0i16, 0i16]; 10];
        mixer.stream(&mut buf);
        assert!(buf.iter().all(|&f| f == [0, 0]));
    }

    #[test]
    fn unknown_id_operations_fail() {
        let mixer = Mixer::new();
        assert!(matches!(mixer.remove("x"), Err(MixerError::NotFound(_))));
        assert!(matches!(mixer.set_paused("x", true), Err(MixerError::NotFound(_))));
        assert!(matches!(mixer.change_volume("x", 1.0), Err(MixerError::NotFound(_))));
    }
}
