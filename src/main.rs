use live_audio_mixer::config::Config;
use live_audio_mixer::encoder::{EncoderSink, OpusOggSink};
use live_audio_mixer::holder::RecordsHolder;
use live_audio_mixer::object_store::FsObjectStore;
use live_audio_mixer::source::http::HttpStreamingSource;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "starting live-audio-mixer");

    let object_store = FsObjectStore::new(format!("./{}", config.object_store_name));
    let holder = Arc::new(RecordsHolder::new(
        "./rec",
        Arc::new(HttpStreamingSource::new()),
        Arc::new(|| Box::new(OpusOggSink::default()) as Box<dyn EncoderSink>),
        "ogg",
        Some(Arc::new(object_store)),
    ));

    let app = live_audio_mixer::server::router(holder);
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!(addr, "listening");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "server exited with error");
    }
}
