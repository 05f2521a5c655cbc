//! Real-time encoder sinks: wall-clock-paced consumers of the [`Mixer`]'s
//! output that write a container-encoded byte stream to an output sink.
//! Grounded on the original `internal/rt-wav-encoder/real-time-encoder.go`
//! and `internal/rt-encoder/ffmpeg-encoder.go`.

pub mod opus_ogg;
pub mod wav;

pub use opus_ogg::OpusOggSink;
pub use wav::WavSink;

use crate::error::SinkError;
use crate::mixer::Mixer;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncSeek, AsyncWrite};
use tokio::sync::oneshot;

/// A container encoder that pulls from a [`Mixer`] at wall-clock pace until
/// told to stop. The mixer is an infinite silence-padded source, so a sink
/// never terminates on upstream EOF — only on `stop` firing.
#[async_trait]
pub trait EncoderSink: Send {
    async fn run(
        self: Box<Self>,
        mixer: Arc<Mixer>,
        output: Box<dyn AsyncWriteSeek>,
        stop: oneshot::Receiver<()>,
    ) -> Result<(), SinkError>;
}

/// Object-safe union of the two trait bounds a sink's output needs. `axum`
/// and plain file handles both satisfy this once pinned behind a box.
pub trait AsyncWriteSeek: AsyncWrite + AsyncSeek + Send + Unpin {}
impl<T: AsyncWrite + AsyncSeek + Send + Unpin> AsyncWriteSeek for T {}
