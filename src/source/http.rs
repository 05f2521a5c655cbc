//! Default, boundary-only [`StreamingSource`] implementation.
//!
//! Real decoding of MP3/FLAC/OGG/WAV is explicitly out of scope for this
//! crate (spec §1); the original service delegated this to a Go `beep`
//! decoder bank plus an `ffmpeg`-backed converter for live sources
//! (`internal/stream-handler/stream-handler.go`,
//! `internal/stream-handler/stream-converter.go`). This implementation
//! fetches the URL's body over HTTP and interprets it as raw interleaved
//! `s16le` PCM at [`AudioFormat::default`] — enough to exercise the
//! pipeline end-to-end against assets that are already raw PCM, without
//! pulling in a decoder stack.

use super::{AudioFormat, PcmSource, StreamingSource};
use crate::error::RecorderError;
use async_trait::async_trait;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub struct HttpStreamingSource {
    client: reqwest::Client,
}

impl HttpStreamingSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpStreamingSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamingSource for HttpStreamingSource {
    async fn get_stream(
        &self,
        url: &str,
        offset_secs: i64,
    ) -> Result<(Box<dyn PcmSource>, AudioFormat), RecorderError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RecorderError::Upstream(url.to_string(), e.to_string()))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RecorderError::Upstream(url.to_string(), e.to_string()))?;

        let format = AudioFormat::default();
        let mut cursor = Cursor::new(bytes);
        let mut frames = Vec::with_capacity(cursor.get_ref().len() / 4);
        while let (Ok(l), Ok(r)) = (
            cursor.read_i16::<LittleEndian>(),
            cursor.read_i16::<LittleEndian>(),
        ) {
            frames.push([l, r]);
        }

        // A negative offset is treated as zero (spec §4.5).
        let skip = offset_secs.max(0) as u64 * format.sample_rate as u64;
        let skip = (skip as usize).min(frames.len());

        Ok((Box::new(BufferedPcmSource::new(frames, skip)), format))
    }
}

/// A fully-buffered in-memory stream, positioned at `start`. Used both by
/// [`HttpStreamingSource`] and as the simplest possible `PcmSource` for
/// tests that need exact control over fixture contents.
pub struct BufferedPcmSource {
    frames: Vec<[i16; 2]>,
    pos: usize,
}

impl BufferedPcmSource {
    pub fn new(frames: Vec<[i16; 2]>, start: usize) -> Self {
        let pos = start.min(frames.len());
        Self { frames, pos }
    }
}

impl PcmSource for BufferedPcmSource {
    fn read_frames(&mut self, buf: &mut [[i16; 2]]) -> usize {
        let remaining = &self.frames[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n
    }
}
