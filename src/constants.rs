//! Fixed points of the mixing pipeline: sample rate, channel layout, and the
//! decibel thresholds used by track volume control.

/// Canonical internal sample rate. Tracks recorded at a different rate are
/// resampled to this one at insertion time.
pub const SAMPLE_RATE: u32 = 48_000;

/// The mixer only ever produces interleaved stereo.
pub const CHANNELS: usize = 2;

/// Resampler quality knob, carried over from the original `beep.Resample`
/// call site (`beep.Resample(3, ...)`). Maps onto a sinc interpolation
/// window length for `rubato`.
pub const RESAMPLE_QUALITY: usize = 3;

/// Below this decibel level a track is flagged silent and contributes
/// nothing to the mix, regardless of its nominal volume.
pub const SILENCE_THRESHOLD_DB: f64 = -60.0;

/// One unit of work for the real-time encoder: pull, encode, and write one
/// second of audio per iteration.
pub const ENCODE_CHUNK: std::time::Duration = std::time::Duration::from_secs(1);

/// `SAMPLE_RATE` expressed as frames-per-encode-chunk.
pub const FRAMES_PER_CHUNK: usize = SAMPLE_RATE as usize;
