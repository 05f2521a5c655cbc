//! Opus-in-Ogg sink: shells out to an external transcoder (an `ffmpeg`-style
//! binary) fed raw `s16le` PCM on stdin, copying its Ogg/Opus stdout to the
//! output sink. Grounded on `internal/rt-encoder/ffmpeg-encoder.go`.

use super::{AsyncWriteSeek, EncoderSink};
use crate::constants::{CHANNELS, ENCODE_CHUNK, FRAMES_PER_CHUNK, SAMPLE_RATE};
use crate::error::SinkError;
use crate::mixer::Mixer;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::oneshot;

/// The external transcoder binary. Overridable so tests and alternate
/// deployments can point at a different `ffmpeg`-compatible build.
pub struct OpusOggSink {
    pub transcoder_path: String,
}

impl Default for OpusOggSink {
    fn default() -> Self {
        Self {
            transcoder_path: "ffmpeg".to_string(),
        }
    }
}

#[async_trait]
impl EncoderSink for OpusOggSink {
    async fn run(
        self: Box<Self>,
        mixer: Arc<Mixer>,
        mut output: Box<dyn AsyncWriteSeek>,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<(), SinkError> {
        let mut child = Command::new(&self.transcoder_path)
            .args([
                "-re",
                "-f",
                "s16le",
                "-ar",
                &SAMPLE_RATE.to_string(),
                "-ac",
                &CHANNELS.to_string(),
                "-i",
                "pipe:0",
                "-c:a",
                "libopus",
                "-f",
                "ogg",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SinkError::SpawnFailed)?;

        let mut stdin = child.stdin.take().expect("spawned with piped stdin");
        let mut stdout = child.stdout.take().expect("spawned with piped stdout");

        let copy_task = tokio::spawn(async move {
            let mut buf = [0u8; 8192];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break Ok(()),
                    Ok(n) => {
                        if let Err(e) = output.write_all(&buf[..n]).await {
                            break Err(SinkError::Write(e));
                        }
                    }
                    Err(e) => break Err(SinkError::Write(e)),
                }
            }
        });

        let mut interval = tokio::time::interval(ENCODE_CHUNK);
        let mut frame_buf = vec![[0i16; 2]; FRAMES_PER_CHUNK];
        let mut write_err: Option<SinkError> = None;

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
                    if let Err(e) = stdin.write_all(&chunk).await {
                        write_err = Some(SinkError::Write(e));
                        break;
                    }
                }
            }
        }

        // Dropping stdin closes the transcoder's input so it flushes and
        // exits; the stdout copy task then observes EOF.
        drop(stdin);

        let status = child.wait().await.map_err(SinkError::SpawnFailed)?;
        let copy_result = copy_task.await.unwrap_or(Ok(()));

        if let Some(e) = write_err {
            return Err(e);
        }
        if !status.success() {
            return Err(SinkError::TranscoderFailed(status));
        }
        copy_result
    }
}
