//! Sample-rate conversion for tracks whose source format disagrees with the
//! mixer's canonical 48kHz. Wraps a [`PcmSource`] with a `rubato` sinc
//! resampler, matching the original's `beep.Resample(3, srcRate, 48000,
//! stream)` call (quality `3` maps onto [`RESAMPLE_QUALITY`]'s sinc window).

use crate::constants::{CHANNELS, RESAMPLE_QUALITY, SAMPLE_RATE};
use crate::source::PcmSource;
use rubato::{
    InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction,
};

/// Frames pulled from the inner source per resampler call. Arbitrary but
/// small enough to keep resampling latency low relative to the encoder's
/// one-second pacing.
const CHUNK_FRAMES: usize = 1024;

pub struct ResamplingSource {
    inner: Box<dyn PcmSource>,
    resampler: SincFixedIn<f32>,
    in_buf: Vec<Vec<f32>>,
    out_buf: Vec<[i16; 2]>,
    out_pos: usize,
    exhausted: bool,
}

impl ResamplingSource {
    pub fn new(inner: Box<dyn PcmSource>, source_rate: u32) -> Self {
        let ratio = SAMPLE_RATE as f64 / source_rate as f64;
        let params = InterpolationParameters {
            sinc_len: 64,
            f_cutoff: 0.95,
            interpolation: InterpolationType::Linear,
            oversampling_factor: 1 << RESAMPLE_QUALITY,
            window: WindowFunction::BlackmanHarris2,
        };
        let resampler = SincFixedIn::<f32>::new(ratio, params, CHUNK_FRAMES, CHANNELS);

        Self {
            inner,
            resampler,
            in_buf: vec![Vec::with_capacity(CHUNK_FRAMES); CHANNELS],
            out_buf: Vec::new(),
            out_pos: 0,
            exhausted: false,
        }
    }

    /// Pulls and resamples one more chunk from the inner source, appending
    /// the result to `out_buf`. Returns `false` once the inner source has
    /// been fully drained.
    fn fill_more(&mut self) -> bool {
        if self.exhausted {
            return false;
        }

        let mut raw = vec![[0i16; 2]; CHUNK_FRAMES];
        let n = self.inner.read_frames(&mut raw);
        if n == 0 {
            self.exhausted = true;
            return false;
        }

        for ch in &mut self.in_buf {
            ch.clear();
        }
        for frame in &raw[..n] {
            self.in_buf[0].push(frame[0] as f32 / i16::MAX as f32);
            self.in_buf[1].push(frame[1] as f32 / i16::MAX as f32);
        }
        // Pad the final, possibly-short chunk so the resampler always sees a
        // full input frame count.
        while self.in_buf[0].len() < CHUNK_FRAMES {
            self.in_buf[0].push(0.0);
            self.in_buf[1].push(0.0);
        }

        let out = match self.resampler.process(&self.in_buf) {
            Ok(out) => out,
            Err(_) => {
                self.exhausted = true;
                return false;
            }
        };

        let out_frames = out[0].len();
        for i in 0..out_frames {
            let l = (out[0][i] * i16::MAX as f32) as i16;
            let r = (out[1][i] * i16::MAX as f32) as i16;
            self.out_buf.push([l, r]);
        }
        true
    }
}

impl PcmSource for ResamplingSource {
    fn read_frames(&mut self, buf: &mut [[i16; 2]]) -> usize {
        let mut written = 0;
        while written < buf.len() {
            if self.out_pos >= self.out_buf.len() {
                self.out_buf.clear();
                self.out_pos = 0;
                if !self.fill_more() {
                    break;
                }
            }
            let available = self.out_buf.len() - self.out_pos;
            let want = buf.len() - written;
            let take = available.min(want);
            buf[written..written + take]
                .copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + take]);
            self.out_pos += take;
            written += take;
        }
        written
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.inner.close()
    }
}
