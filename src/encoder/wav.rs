//! WAV sink: writes a RIFF/WAVE header with placeholder sizes, streams raw
//! little-endian PCM, and back-patches `FileSize`/`DataSize` on stop.
//! Grounded on `internal/rt-wav-encoder/real-time-encoder.go`.

use super::{AsyncWriteSeek, EncoderSink};
use crate::constants::{CHANNELS, ENCODE_CHUNK, FRAMES_PER_CHUNK, SAMPLE_RATE};
use crate::error::SinkError;
use crate::mixer::Mixer;
use async_trait::async_trait;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::oneshot;

const PRECISION_BYTES: u8 = 2;

/// Position of the 32-bit little-endian `FileSize` field, 4 bytes into the
/// RIFF header (after the "RIFF" tag).
const FILE_SIZE_OFFSET: u64 = 4;
/// Position of the 32-bit little-endian `DataSize` field, just after the
/// "data" tag.
const DATA_SIZE_OFFSET: u64 = 40;
const HEADER_LEN: u64 = 44;

pub struct WavSink;

impl WavSink {
    fn header(channels: u16, sample_rate: u32, precision: u8) -> Result<Vec<u8>, SinkError> {
        if channels == 0 {
            return Err(SinkError::BadChannelCount(channels));
        }
        if !(1..=3).contains(&precision) {
            return Err(SinkError::BadPrecision(precision));
        }

        let block_align = channels as u32 * precision as u32;
        let byte_rate = sample_rate * block_align;
        let bits_per_sample = precision as u32 * 8;

        let mut h = Vec::with_capacity(HEADER_LEN as usize);
        h.extend_from_slice(b"RIFF");
        h.extend_from_slice(&0u32.to_le_bytes()); // FileSize placeholder
        h.extend_from_slice(b"WAVE");
        h.extend_from_slice(b"fmt ");
        h.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
        h.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
        h.extend_from_slice(&channels.to_le_bytes());
        h.extend_from_slice(&sample_rate.to_le_bytes());
        h.extend_from_slice(&byte_rate.to_le_bytes());
        h.extend_from_slice(&(block_align as u16).to_le_bytes());
        h.extend_from_slice(&(bits_per_sample as u16).to_le_bytes());
        h.extend_from_slice(b"data");
        h.extend_from_slice(&0u32.to_le_bytes()); // DataSize placeholder
        debug_assert_eq!(h.len() as u64, HEADER_LEN);
        Ok(h)
    }
}

#[async_trait]
impl EncoderSink for WavSink {
    async fn run(
        self: Box<Self>,
        mixer: Arc<Mixer>,
        mut output: Box<dyn AsyncWriteSeek>,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<(), SinkError> {
        let header = Self::header(CHANNELS as u16, SAMPLE_RATE, PRECISION_BYTES)?;
        output.write_all(&header).await?;

        let mut interval = tokio::time::interval(ENCODE_CHUNK);
        let mut data_bytes: u64 = 0;
        let mut frame_buf = vec![[0i16; 2]; FRAMES_PER_CHUNK];

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = interval.tick() => {
                    crate::mixer::dispatch_ended(mixer.stream(&mut frame_buf));
                    let mut chunk = Vec::with_capacity(frame_buf.len() * 4);
                    for frame in &frame_buf {
                        chunk.extend_from_slice(&frame[0].to_le_bytes());
                        chunk.extend_from_slice(&frame[1].to_le_bytes());
                    }
                    output.write_all(&chunk).await?;
                    data_bytes += chunk.len() as u64;
                }
            }
        }

        let file_size = (HEADER_LEN - 8) + data_bytes;
        output.seek(SeekFrom::Start(FILE_SIZE_OFFSET)).await?;
        output.write_all(&(file_size as u32).to_le_bytes()).await?;
        output.seek(SeekFrom::Start(DATA_SIZE_OFFSET)).await?;
        output.write_all(&(data_bytes as u32).to_le_bytes()).await?;
        output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_rejects_zero_channels() {
        assert!(matches!(
            WavSink::header(0, SAMPLE_RATE, 2),
            Err(SinkError::BadChannelCount(0))
        ));
    }

    #[test]
    fn header_rejects_bad_precision() {
        assert!(matches!(
            WavSink::header(2, SAMPLE_RATE, 4),
            Err(SinkError::BadPrecision(4))
        ));
    }

    #[test]
    fn header_is_44_bytes() {
        let h = WavSink::header(2, SAMPLE_RATE, 2).unwrap();
        assert_eq!(h.len() as u64, HEADER_LEN);
        assert_eq!(&h[0..4], b"RIFF");
        assert_eq!(&h[8..12], b"WAVE");
    }
}
