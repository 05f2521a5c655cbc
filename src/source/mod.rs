//! [`PcmSource`] and [`StreamingSource`] — the boundary the mixer and
//! recorder consume, and the two contracts an external decoding layer must
//! satisfy. Real MP3/FLAC/OGG decoding is out of scope for this crate (spec
//! §1); [`http::HttpStreamingSource`] is a minimal default that treats the
//! fetched bytes as raw PCM, and [`sine::SineSource`] is an in-process
//! synthetic source used by the test suite so it never touches the network.

pub mod http;
pub mod sine;

use crate::error::RecorderError;
use async_trait::async_trait;

/// Sample rate, channel count, and per-sample precision of a decoded
/// stream, mirroring the original `beep.Format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Frames per second. `0` means "unknown"; the mixer treats this as
    /// 48000 with a warning (spec §3, Mixer invariant).
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample per channel (1, 2, or 3).
    pub precision: u8,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: crate::constants::SAMPLE_RATE,
            channels: crate::constants::CHANNELS as u16,
            precision: 2,
        }
    }
}

/// A closeable, pull-based stereo PCM stream — the Rust shape of
/// `beep.StreamSeekCloser`.
///
/// Implementations are not required to be seekable post-construction;
/// `SEEK` is implemented upstream by re-opening the stream at an offset
/// (spec §4.2), not by calling back into an already-open source.
pub trait PcmSource: Send {
    /// Fill `buf` with up to `buf.len()` stereo frames, returning the
    /// number actually written. A return value less than `buf.len()`
    /// signals end-of-stream; frames beyond the returned count are left
    /// untouched by the callee and must not be read by the caller.
    fn read_frames(&mut self, buf: &mut [[i16; 2]]) -> usize;

    /// Release any underlying resource (file handle, socket, decoder).
    /// Errors here are logged as warnings by the caller, never propagated
    /// as a hard failure (spec §4.1, "close errors are non-fatal").
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// External collaborator: resolves a track URL to a decoded PCM stream.
/// Out of scope per spec §1 beyond this contract — see module docs.
#[async_trait]
pub trait StreamingSource: Send + Sync {
    /// Returns a stream starting `offset_secs` into the source. A negative
    /// offset is treated as zero. An offset past the end of the source may
    /// return an empty stream; that is not an error.
    async fn get_stream(
        &self,
        url: &str,
        offset_secs: i64,
    ) -> Result<(Box<dyn PcmSource>, AudioFormat), RecorderError>;
}
