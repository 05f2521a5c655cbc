//! The recorder: a per-session event-driven controller that translates
//! [`Event`]s into [`Mixer`] operations and owns that session's encoder.
//!
//! Grounded on `songbird`'s `Call` (the per-guild handle that owns one
//! driver and reacts to gateway/voice events), generalized from "one guild's
//! voice connection" to "one session's mix".

pub mod event;

use crate::encoder::{AsyncWriteSeek, EncoderSink};
use crate::error::MixerError;
use crate::mixer::Mixer;
use crate::source::StreamingSource;
use event::{Event, EventKind};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, Mutex};

struct RecorderState {
    last_event: HashMap<String, Event>,
    stop_tx: Option<oneshot::Sender<()>>,
}

/// Shared, `Arc`-owned recorder state. `Recorder` is a thin handle around
/// this so the end-of-track callback can hold a [`Weak`] reference without
/// keeping the session alive past `stop` (spec §9 ownership note).
pub struct RecorderShared {
    mixer: Arc<Mixer>,
    source: Arc<dyn StreamingSource>,
    state: Mutex<RecorderState>,
}

#[derive(Clone)]
pub struct Recorder(Arc<RecorderShared>);

impl Recorder {
    pub fn new(source: Arc<dyn StreamingSource>) -> Self {
        Self(Arc::new(RecorderShared {
            mixer: Arc::new(Mixer::new()),
            source,
            state: Mutex::new(RecorderState {
                last_event: HashMap::new(),
                stop_tx: None,
            }),
        }))
    }

    pub fn mixer(&self) -> Arc<Mixer> {
        self.0.mixer.clone()
    }

    /// Launches the encoder as a background task pulling from this
    /// session's mixer. Returns a channel that yields the encoder's final
    /// result exactly once.
    pub async fn start(
        &self,
        sink: Box<dyn EncoderSink>,
        output: Box<dyn AsyncWriteSeek>,
    ) -> oneshot::Receiver<Result<(), crate::error::SinkError>> {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        self.0.state.lock().await.stop_tx = Some(stop_tx);

        let mixer = self.0.mixer.clone();
        tokio::spawn(async move {
            let result = sink.run(mixer, output, stop_rx).await;
            let _ = done_tx.send(result);
        });

        done_rx
    }

    /// Fires the encoder's stop signal and tears down every still-playing
    /// track. Idempotent: a recorder with no outstanding signal (already
    /// stopped, or never started) still closes out the mixer, but does so
    /// harmlessly against an already-empty track set.
    pub async fn stop(&self) {
        let mut state = self.0.state.lock().await;
        if let Some(tx) = state.stop_tx.take() {
            let _ = tx.send(());
        }
        self.0.mixer.close_all();
    }

    /// Applies one event under the recorder's mutex.
    pub async fn update(&self, event: Event) {
        let url = event.asset_url.clone();
        {
            let mut state = self.0.state.lock().await;
            state.last_event.insert(url.clone(), event.clone());
        }

        match event.kind {
            EventKind::Play => self.play(&url, event.volume_delta_db, event.loop_, 0).await,
            EventKind::Stop => self.stop_track(&url),
            EventKind::Pause => self.set_paused(&url, true),
            EventKind::Resume => self.set_paused(&url, false),
            EventKind::Volume => self.change_volume(&url, event.volume_delta_db),
            EventKind::Seek => {
                self.stop_track(&url);
                self.play(&url, event.volume_delta_db, event.loop_, event.seek_position_sec)
                    .await;
            }
            EventKind::Other => {}
        }
    }

    fn play<'a>(
        &'a self,
        url: &'a str,
        volume_db: f64,
        _loop_hint: bool,
        offset_secs: i32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let stream = self.0.source.get_stream(url, offset_secs as i64).await;
            let (pcm, format) = match stream {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(url, error = %e, "failed to open track stream, skipping");
                    return;
                }
            };

            let weak: Weak<RecorderShared> = Arc::downgrade(&self.0);
            let end_url = url.to_string();
            let on_end: crate::mixer::track::OnEnd = Box::new(move |_id: &str| {
                let weak = weak.clone();
                let end_url = end_url.clone();
                tokio::spawn(async move {
                    if let Some(shared) = weak.upgrade() {
                        Recorder(shared).handle_end(&end_url).await;
                    }
                });
            });

            if let Err(e) = self.0.mixer.add(url, pcm, format, volume_db, Some(on_end)) {
                match e {
                    MixerError::AlreadyExists(id) => {
                        tracing::warn!(track = %id, "track already playing, ignoring duplicate play");
                    }
                    MixerError::NotFound(_) => unreachable!("add only fails with AlreadyExists"),
                }
            }
        })
    }

    fn stop_track(&self, url: &str) {
        if let Err(MixerError::NotFound(_)) = self.0.mixer.remove(url) {
            tracing::debug!(url, "stop on a track that was not playing");
        }
    }

    fn set_paused(&self, url: &str, paused: bool) {
        if let Err(e) = self.0.mixer.set_paused(url, paused) {
            tracing::warn!(url, error = %e, "pause/resume on unknown track");
        }
    }

    fn change_volume(&self, url: &str, delta_db: f64) {
        if let Err(e) = self.0.mixer.change_volume(url, delta_db) {
            tracing::warn!(url, error = %e, "volume change on unknown track");
        }
    }

    /// Invoked (from a freshly spawned task, never from inside the mixer's
    /// lock) when `url`'s track naturally reaches end-of-stream. Restarts it
    /// iff the most recently recorded event for `url` still asks to loop —
    /// an `OTHER` event can flip this without a new `PLAY`.
    async fn handle_end(&self, url: &str) {
        let should_loop = {
            let state = self.0.state.lock().await;
            state.last_event.get(url).map(|e| e.loop_).unwrap_or(false)
        };
        if should_loop {
            self.play(url, 0.0, true, 0).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SAMPLE_RATE;
    use crate::source::sine::SineSource;
    use crate::source::AudioFormat;
    use async_trait::async_trait;

    /// Every URL resolves to a one-second sine wave, honoring the requested
    /// offset the way a real decoder would.
    struct TestSource;

    #[async_trait]
    impl StreamingSource for TestSource {
        async fn get_stream(
            &self,
            _url: &str,
            offset_secs: i64,
        ) -> Result<(Box<dyn crate::source::PcmSource>, AudioFormat), crate::error::RecorderError>
        {
            let skip = offset_secs.max(0) as u64 * SAMPLE_RATE as u64;
            Ok((
                Box::new(SineSource::new_at_offset(SAMPLE_RATE, 440.0, 1.0, skip)),
                AudioFormat::default(),
            ))
        }
    }

    fn play_event(url: &str, loop_: bool) -> Event {
        Event {
            record_id: "s1".into(),
            kind: EventKind::Play,
            asset_url: url.into(),
            loop_,
            volume_delta_db: 0.0,
            seek_position_sec: 0,
        }
    }

    #[tokio::test]
    async fn play_then_stop_removes_track() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder.update(play_event("a", false)).await;
        assert!(recorder.mixer().contains("a"));

        recorder
            .update(Event {
                kind: EventKind::Stop,
                ..play_event("a", false)
            })
            .await;
        assert!(!recorder.mixer().contains("a"));
    }

    #[tokio::test]
    async fn pause_then_resume_round_trips() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder.update(play_event("a", false)).await;

        recorder
            .update(Event {
                kind: EventKind::Pause,
                ..play_event("a", false)
            })
            .await;
        let mut buf = vec![[0i16, 0i16]; 10];
        let ended = recorder.mixer().stream(&mut buf);
        assert!(ended.is_empty());
        assert!(buf.iter().all(|&f| f == [0, 0]));

        recorder
            .update(Event {
                kind: EventKind::Resume,
                ..play_event("a", false)
            })
            .await;
        assert!(recorder.mixer().contains("a"));
    }

    #[tokio::test]
    async fn seek_reopens_the_stream_at_an_offset() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder.update(play_event("a", false)).await;

        recorder
            .update(Event {
                kind: EventKind::Seek,
                seek_position_sec: 1,
                ..play_event("a", false)
            })
            .await;
        assert!(recorder.mixer().contains("a"));
    }

    #[tokio::test]
    async fn update_on_unknown_track_is_ignored_not_fatal() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder
            .update(Event {
                kind: EventKind::Stop,
                ..play_event("never-played", false)
            })
            .await;
        recorder
            .update(Event {
                kind: EventKind::Volume,
                ..play_event("never-played", false)
            })
            .await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder.stop().await;
        recorder.stop().await;
    }

    #[tokio::test]
    async fn looping_track_restarts_after_natural_end() {
        let recorder = Recorder::new(Arc::new(TestSource));
        recorder.update(play_event("a", true)).await;

        // Drain past the one-second source so it naturally ends.
        let mut buf = vec![[0i16, 0i16]; SAMPLE_RATE as usize + 1];
        let ended = recorder.mixer().stream(&mut buf);
        assert_eq!(ended.len(), 1);
        (ended.into_iter().next().unwrap().on_end.unwrap())("a");

        // The end-of-track handler re-adds on a spawned task; give it a turn.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(recorder.mixer().contains("a"));
    }
}
