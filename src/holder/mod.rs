//! The records holder: lifecycle manager for many concurrent sessions.
//! Grounded directly on `songbird::Songbird`, which maps `GuildId ->
//! Arc<Mutex<Call>>` the same way this maps a session id to a `Session`.

use crate::encoder::EncoderSink;
use crate::error::{HolderError, SinkError};
use crate::object_store::ObjectStore;
use crate::recorder::event::Event;
use crate::recorder::Recorder;
use crate::source::StreamingSource;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

struct Session {
    recorder: Recorder,
    output_path: PathBuf,
    done_rx: oneshot::Receiver<Result<(), SinkError>>,
}

/// Builds a fresh [`EncoderSink`] per session. A closure rather than a
/// shared instance because a sink owns per-session process/header state.
pub type SinkFactory = Arc<dyn Fn() -> Box<dyn EncoderSink> + Send + Sync>;

pub struct RecordsHolder {
    sessions: DashMap<String, Session>,
    base_dir: PathBuf,
    source: Arc<dyn StreamingSource>,
    sink_factory: SinkFactory,
    extension: String,
    object_store: Option<Arc<dyn ObjectStore>>,
}

impl RecordsHolder {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        source: Arc<dyn StreamingSource>,
        sink_factory: SinkFactory,
        extension: impl Into<String>,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            base_dir: base_dir.into(),
            source,
            sink_factory,
            extension: extension.into(),
            object_store,
        }
    }

    /// Begins a new session under `id`. Rejects a duplicate, already-active
    /// id.
    pub async fn record(&self, id: &str) -> Result<(), HolderError> {
        if self.sessions.contains_key(id) {
            return Err(HolderError::AlreadyExists(id.to_string()));
        }

        let dir = self.base_dir.join(id);
        tokio::fs::create_dir_all(&dir).await?;
        let output_path = dir.join(format!("rec.{}", self.extension));
        let file = tokio::fs::File::create(&output_path).await?;

        let recorder = Recorder::new(self.source.clone());
        let sink = (self.sink_factory)();
        let done_rx = recorder.start(sink, Box::new(file)).await;

        self.sessions.insert(
            id.to_string(),
            Session {
                recorder,
                output_path,
                done_rx,
            },
        );
        Ok(())
    }

    /// Stops a session: signals the encoder, waits for it to finish writing,
    /// and — if an object store is configured — uploads the artifact under
    /// `"<id>.<ext>"` before deleting the session directory.
    pub async fn stop(&self, id: &str) -> Result<(), HolderError> {
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| HolderError::NotFound(id.to_string()))?;

        session.recorder.stop().await;
        match session.done_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(HolderError::Sink(e)),
            Err(_) => tracing::warn!(id, "encoder task dropped its completion channel"),
        }

        if let Some(store) = &self.object_store {
            let key = format!("{}.{}", id, self.extension);
            store.upload(&session.output_path, &key).await?;

            if let Some(dir) = session.output_path.parent() {
                if let Err(e) = tokio::fs::remove_dir_all(dir).await {
                    tracing::warn!(id, error = %e, "failed to clean up session directory");
                }
            }
        }

        Ok(())
    }

    /// Forwards one event to the named session's recorder. The session's map
    /// entry is only held for the lookup, never across the `.update` await,
    /// so unrelated sessions are never blocked by a slow event.
    pub async fn update(&self, event: Event) -> Result<(), HolderError> {
        let recorder = {
            let session = self
                .sessions
                .get(&event.record_id)
                .ok_or_else(|| HolderError::NotFound(event.record_id.clone()))?;
            session.recorder.clone()
        };
        recorder.update(event).await;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::WavSink;
    use crate::recorder::event::EventKind;
    use crate::source::sine::SineSource;
    use crate::source::AudioFormat;
    use async_trait::async_trait;

    struct TestSource;

    #[async_trait]
    impl StreamingSource for TestSource {
        async fn get_stream(
            &self,
            _url: &str,
            _offset_secs: i64,
        ) -> Result<(Box<dyn crate::source::PcmSource>, AudioFormat), crate::error::RecorderError>
        {
            Ok((
                Box::new(SineSource::new(48_000, 440.0, 5.0)),
                AudioFormat::default(),
            ))
        }
    }

    fn holder(base: &std::path::Path) -> RecordsHolder {
        RecordsHolder::new(
            base.to_path_buf(),
            Arc::new(TestSource),
            Arc::new(|| Box::new(WavSink) as Box<dyn EncoderSink>),
            "wav",
            None,
        )
    }

    #[tokio::test]
    async fn record_rejects_duplicate_session() {
        let dir = tempfile_dir();
        let holder = holder(dir.path());
        holder.record("s1").await.unwrap();
        let err = holder.record("s1").await.unwrap_err();
        assert!(matches!(err, HolderError::AlreadyExists(id) if id == "s1"));
        holder.stop("s1").await.unwrap();
    }

    #[tokio::test]
    async fn stop_unknown_session_errors() {
        let dir = tempfile_dir();
        let holder = holder(dir.path());
        let err = holder.stop("ghost").await.unwrap_err();
        assert!(matches!(err, HolderError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn update_unknown_session_errors() {
        let dir = tempfile_dir();
        let holder = holder(dir.path());
        let err = holder
            .update(Event {
                record_id: "ghost".into(),
                kind: EventKind::Stop,
                asset_url: "x".into(),
                loop_: false,
                volume_delta_db: 0.0,
                seek_position_sec: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HolderError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn start_stop_produces_a_wav_file() {
        let dir = tempfile_dir();
        let holder = holder(dir.path());
        holder.record("s1").await.unwrap();
        assert!(holder.contains("s1"));
        holder.stop("s1").await.unwrap();
        assert!(!holder.contains("s1"));

        let path = dir.path().join("s1").join("rec.wav");
        let metadata = tokio::fs::metadata(&path).await.unwrap();
        assert!(metadata.len() >= 44);
    }

    /// A bare, dependency-free temp directory: created under `std::env::temp_dir()`
    /// and removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn path(&self) -> &std::path::Path {
            &self.0
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn tempfile_dir() -> TempDir {
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let pid = std::process::id();
        let dir = std::env::temp_dir().join(format!("live-audio-mixer-test-{pid}-{n}"));
        std::fs::create_dir_all(&dir).unwrap();
        TempDir(dir)
    }
}
