//! Synthetic PCM source used by the test suite (spec §8 addendum: tests run
//! against in-process fixtures rather than real network fetches). Grounded
//! on the sine-wave generator pattern used by `pmoaudio`'s `SourceNode` for
//! its own fixtures.

use super::PcmSource;

/// Produces a fixed number of frames of a sine wave at `frequency`, then
/// reports end-of-stream. A `duration_secs` of `0` with `sample_rate` > 0
/// yields an immediately-exhausted source, useful for seek-past-end tests.
pub struct SineSource {
    sample_rate: u32,
    frequency: f32,
    amplitude: i16,
    frames_remaining: u64,
    frames_emitted: u64,
}

impl SineSource {
    pub fn new(sample_rate: u32, frequency: f32, duration_secs: f64) -> Self {
        let total_frames = (sample_rate as f64 * duration_secs).round() as u64;
        Self {
            sample_rate,
            frequency,
            amplitude: i16::MAX / 2,
            frames_remaining: total_frames,
            frames_emitted: 0,
        }
    }

    /// A source that starts `skip_frames` into the waveform, used to model
    /// `GetStream(url, offsetSecs)` without a real decoder.
    pub fn new_at_offset(sample_rate: u32, frequency: f32, duration_secs: f64, skip_frames: u64) -> Self {
        let mut s = Self::new(sample_rate, frequency, duration_secs);
        s.frames_remaining = s.frames_remaining.saturating_sub(skip_frames);
        s.frames_emitted = skip_frames;
        s
    }
}

impl PcmSource for SineSource {
    fn read_frames(&mut self, buf: &mut [[i16; 2]]) -> usize {
        let n = (buf.len() as u64).min(self.frames_remaining) as usize;
        for slot in buf.iter_mut().take(n) {
            let t = self.frames_emitted as f32 / self.sample_rate as f32;
            let sample =
                (2.0 * std::f32::consts::PI * self.frequency * t).sin() * self.amplitude as f32;
            *slot = [sample as i16, sample as i16];
            self.frames_emitted += 1;
        }
        self.frames_remaining -= n as u64;
        n
    }
}
