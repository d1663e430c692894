//! Legacy SSE transport: one long-lived event stream per session carries the
//! responses, while `POST /message` carries the requests.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::session::SseHandle;
use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sse", get(open_session))
        .route("/message", post(deliver_message))
}

async fn open_session(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let SseHandle {
        session_id,
        events,
        guard,
    } = state.sse.register();
    tracing::info!(session_id = %session_id, "sse session opened");

    let registry = state.sse.clone();
    let watched = session_id.clone();
    tokio::spawn(async move {
        guard.closed().await;
        if registry.remove(&watched) {
            tracing::info!(session_id = %watched, "sse session closed");
        }
    });

    // Clients learn where to POST from the first event on the stream.
    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={session_id}"));
    let stream =
        tokio_stream::once(Ok::<_, Infallible>(endpoint)).chain(ReceiverStream::new(events));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[derive(Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Runs a JSON-RPC message against the shared server and pushes every reply
/// onto the addressed session's event stream. Without an explicit sessionId
/// the message falls through to the sole active session.
async fn deliver_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let resolved = match &query.session_id {
        Some(id) => state
            .sse
            .sender(id)
            .map(|tx| (id.clone(), tx))
            .ok_or_else(|| format!("No transport found for sessionId {id}")),
        None => state.sse.single().ok_or_else(|| {
            "Missing sessionId query parameter and no single active SSE session found".to_string()
        }),
    };
    let (session_id, tx) = match resolved {
        Ok(resolved) => resolved,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON body" })),
            )
                .into_response();
        }
    };

    let responses = state.server.handle_incoming_message(incoming).await;
    for response in responses {
        let event = Event::default()
            .event("message")
            .data(serde_json::to_string(&response).unwrap_or_default());
        if tx.send(Ok(event)).await.is_err() {
            tracing::warn!(session_id = %session_id, "sse session dropped mid-delivery");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process MCP message" })),
            )
                .into_response();
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
