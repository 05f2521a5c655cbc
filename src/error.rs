//! Error taxonomy for the mixing pipeline (spec §7).
//!
//! Each core component gets its own error enum rather than one shared type,
//! so a caller can match on exactly the failures its component can produce.
//! `Benign` failures (a close error on a stream that already self-closed)
//! are not represented as error variants at all — they are logged at `warn`
//! at the call site and otherwise ignored, per the propagation policy.

use thiserror::Error;

/// Errors produced by [`crate::mixer::Mixer`] operations.
#[derive(Debug, Error)]
pub enum MixerError {
    #[error("track with id \"{0}\" already exists")]
    AlreadyExists(String),
    #[error("track with id \"{0}\" not found")]
    NotFound(String),
}

/// Errors produced by [`crate::recorder::Recorder`] operations.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("mixer error: {0}")]
    Mixer(#[from] MixerError),
    #[error("failed to open stream for \"{0}\": {1}")]
    Upstream(String, String),
}

/// Errors produced by encoder sinks (spec: BadFormat / Sink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid number of channels: {0}")]
    BadChannelCount(u16),
    #[error("unsupported precision {0}, expected 1, 2 or 3 bytes")]
    BadPrecision(u8),
    #[error("failed to spawn transcoder: {0}")]
    SpawnFailed(#[source] std::io::Error),
    #[error("transcoder exited with status {0}")]
    TranscoderFailed(std::process::ExitStatus),
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Errors produced by [`crate::holder::RecordsHolder`] operations.
#[derive(Debug, Error)]
pub enum HolderError {
    #[error("record with id \"{0}\" already exists")]
    AlreadyExists(String),
    #[error("record with id \"{0}\" does not exist")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoder error: {0}")]
    Sink(#[from] SinkError),
    #[error("upload failed: {0}")]
    Upload(String),
}
