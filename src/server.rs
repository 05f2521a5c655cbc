//! HTTP + WebSocket front end. The literal RPC surface (a gRPC
//! request/response plus a streaming `StreamEvents` call) is out of scope;
//! this is the idiomatic-`axum` equivalent of the same three call shapes,
//! built from crates already present in the example pack.

use crate::error::HolderError;
use crate::holder::RecordsHolder;
use crate::recorder::event::Event;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn router(holder: Arc<RecordsHolder>) -> Router {
    Router::new()
        .route("/sessions/:id/start", post(start))
        .route("/sessions/:id/stop", post(stop))
        .route("/sessions/:id/events", get(events))
        .with_state(holder)
}

async fn start(
    State(holder): State<Arc<RecordsHolder>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    holder.record(&id).await?;
    Ok(StatusCode::CREATED)
}

async fn stop(
    State(holder): State<Arc<RecordsHolder>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    holder.stop(&id).await?;
    Ok(StatusCode::OK)
}

async fn events(
    ws: WebSocketUpgrade,
    State(holder): State<Arc<RecordsHolder>>,
    Path(id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| handle_events(socket, holder, id))
}

/// Applies each inbound event as it arrives. A malformed frame or an error
/// applying an individual event is logged and the socket stays open —
/// errors never terminate the stream (spec §6).
async fn handle_events(mut socket: WebSocket, holder: Arc<RecordsHolder>, record_id: String) {
    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Binary(b) => match String::from_utf8(b.to_vec()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(record_id, error = %e, "non-utf8 event frame, ignoring");
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let event: Event = match serde_json::from_str(&text) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(record_id, error = %e, "malformed event frame, ignoring");
                continue;
            }
        };

        if let Err(e) = holder.update(event).await {
            tracing::warn!(record_id, error = %e, "failed to apply event");
        }
    }
}

struct ApiError(HolderError);

impl From<HolderError> for ApiError {
    fn from(e: HolderError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HolderError::NotFound(_) => StatusCode::NOT_FOUND,
            HolderError::AlreadyExists(_) => StatusCode::CONFLICT,
            HolderError::Io(_) | HolderError::Sink(_) | HolderError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.0.to_string()).into_response()
    }
}
