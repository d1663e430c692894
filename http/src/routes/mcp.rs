//! Streamable HTTP transport: JSON-RPC over POST plus an optional
//! server-to-client SSE stream, keyed by the `mcp-session-id` header.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::any};
use serde_json::{Value, json};
use tokio_stream::wrappers::ReceiverStream;

use crate::session::StreamAttach;
use crate::state::AppState;

const MCP_PATH: &str = "/mcp";
const SESSION_ID_HEADER: &str = "mcp-session-id";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route(MCP_PATH, any(mcp_endpoint))
}

async fn mcp_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let accept = normalize_accept(
        headers
            .get(ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(""),
    );
    tracing::debug!(method = %method, accept = %accept, "mcp transport request");

    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    match session_id {
        Some(session_id) => routed_request(state, method, session_id, body).await,
        None => fresh_request(state, method, body).await,
    }
}

/// Requests carrying a session header. The session must exist; after that the
/// method decides between JSON-RPC exchange, stream attachment, and teardown.
async fn routed_request(
    state: AppState,
    method: Method,
    session_id: String,
    body: Bytes,
) -> Response {
    if !state.streamable.contains(&session_id) {
        return session_not_found(&session_id);
    }

    if method == Method::POST {
        let incoming: Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(_) => return parse_error(),
        };
        let responses = state.server.handle_incoming_message(incoming).await;
        return jsonrpc_reply(responses, None);
    }

    if method == Method::GET {
        return match state.streamable.attach_stream(&session_id) {
            StreamAttach::Attached { events, guard } => {
                let registry = state.streamable.clone();
                let watched = session_id.clone();
                tokio::spawn(async move {
                    guard.closed().await;
                    if registry.close(&watched) {
                        tracing::info!(session_id = %watched, "streamable session stream dropped");
                    }
                });
                Sse::new(ReceiverStream::new(events))
                    .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
                    .into_response()
            }
            StreamAttach::AlreadyStreaming => stream_conflict(),
            StreamAttach::NotFound => session_not_found(&session_id),
        };
    }

    if method == Method::DELETE {
        if state.streamable.close(&session_id) {
            tracing::info!(session_id = %session_id, "streamable session closed");
        }
        return StatusCode::OK.into_response();
    }

    method_not_allowed()
}

/// Requests without a session header. Only a POSTed `initialize` request is
/// admitted; the session id is minted once the handshake returns a result, so
/// a rejected initialize leaves nothing behind.
async fn fresh_request(state: AppState, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return missing_session();
    }
    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return missing_session(),
    };
    if !is_initialize_request(&incoming) {
        return missing_session();
    }

    let responses = state.server.handle_incoming_message(incoming).await;
    let completed = responses
        .first()
        .map(|response| response.get("result").is_some())
        .unwrap_or(false);
    if !completed {
        return jsonrpc_reply(responses, None);
    }

    let session_id = state.streamable.activate();
    tracing::info!(session_id = %session_id, "streamable session initialized");
    jsonrpc_reply(responses, Some(&session_id))
}

fn jsonrpc_reply(responses: Vec<Value>, session_id: Option<&str>) -> Response {
    let mut response = if responses.is_empty() {
        // Notifications produce no replies.
        StatusCode::ACCEPTED.into_response()
    } else if responses.len() == 1 {
        (
            StatusCode::OK,
            Json(responses.into_iter().next().unwrap_or(Value::Null)),
        )
            .into_response()
    } else {
        (StatusCode::OK, Json(Value::Array(responses))).into_response()
    };

    if let Some(session_id) = session_id {
        if let Ok(value) = HeaderValue::from_str(session_id) {
            response.headers_mut().insert(SESSION_ID_HEADER, value);
        }
    }
    response
}

/// Only a single `initialize` request object may open a session. Batches are
/// rejected even when one of their entries is an initialize.
fn is_initialize_request(message: &Value) -> bool {
    message
        .get("method")
        .and_then(Value::as_str)
        .map(|method| method == "initialize")
        .unwrap_or(false)
}

/// Clients frequently send only one of the two content types the streamable
/// transport negotiates. The transport answers either way; this records the
/// effective accept value.
fn normalize_accept(raw: &str) -> String {
    if raw.is_empty() {
        return "application/json, text/event-stream".to_string();
    }
    let has_json = raw.contains("application/json");
    let has_stream = raw.contains("text/event-stream");
    if has_json && !has_stream {
        return format!("{raw}, text/event-stream");
    }
    if has_stream && !has_json {
        return format!("{raw}, application/json");
    }
    raw.to_string()
}

fn session_not_found(session_id: &str) -> Response {
    rpc_error(
        StatusCode::NOT_FOUND,
        -32001,
        &format!("Session not found: {session_id}"),
    )
}

fn missing_session() -> Response {
    rpc_error(
        StatusCode::BAD_REQUEST,
        -32000,
        "Bad Request: missing or invalid MCP session. Send initialize as POST /mcp first.",
    )
}

fn parse_error() -> Response {
    rpc_error(StatusCode::BAD_REQUEST, -32700, "Parse error")
}

fn stream_conflict() -> Response {
    rpc_error(
        StatusCode::CONFLICT,
        -32000,
        "Conflict: only one SSE stream is allowed per session",
    )
}

fn method_not_allowed() -> Response {
    rpc_error(StatusCode::METHOD_NOT_ALLOWED, -32000, "Method not allowed")
}

fn rpc_error(status: StatusCode, code: i64, message: &str) -> Response {
    (
        status,
        Json(json!({
            "jsonrpc": "2.0",
            "error": {
                "code": code,
                "message": message
            },
            "id": null
        })),
    )
        .into_response()
}
