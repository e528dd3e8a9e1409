//! Legacy MCP HTTP+SSE binding.
//!
//! `GET /sse` opens a session and an event stream. The first event,
//! `endpoint`, names the URL the client must `POST` its JSON-RPC messages
//! to; replies come back on the stream as `message` events.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, Request, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use rmcp::ServiceExt;
use rmcp::model::{ClientJsonRpcMessage, GetExtensions, JsonRpcMessage, ServerJsonRpcMessage};
use serde::Deserialize;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, PollSender};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::server::GitHubMcpServer;

const CHANNEL_CAPACITY: usize = 64;
const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

type SessionMap = Arc<RwLock<HashMap<String, mpsc::Sender<ClientJsonRpcMessage>>>>;

#[derive(Clone)]
struct SseState {
    server: GitHubMcpServer,
    base_url: Url,
    sessions: SessionMap,
    shutdown: CancellationToken,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

pub(super) fn router(server: GitHubMcpServer, base_url: Url, shutdown: CancellationToken) -> Router {
    routes(SseState {
        server,
        base_url,
        sessions: Arc::default(),
        shutdown,
    })
}

fn routes(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(open_stream))
        .route("/message", post(post_message))
        .with_state(state)
}

/// URL a session's client posts messages to.
fn endpoint_url(base: &Url, session_id: &str) -> String {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("message");
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("sessionId", session_id);
    url.into()
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientJsonRpcMessage>(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<ServerJsonRpcMessage>(CHANNEL_CAPACITY);

    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), inbound_tx);
    info!(session_id = %session_id, "SSE session opened");

    let transport = (
        PollSender::new(outbound_tx),
        ReceiverStream::new(inbound_rx),
    );
    let server = state.server.clone();
    let sessions = state.sessions.clone();
    // Cancelled on server shutdown, or when the event stream is dropped
    // because the client went away.
    let ct = state.shutdown.child_token();
    let disconnect = ct.clone().drop_guard();
    let id = session_id.clone();
    tokio::spawn(async move {
        // The handshake waits on the client, so it must also yield to shutdown.
        let started = tokio::select! {
            _ = ct.cancelled() => None,
            result = server.serve_with_ct(transport, ct.clone()) => Some(result),
        };
        match started {
            Some(Ok(running)) => {
                if let Err(e) = running.waiting().await {
                    warn!(session_id = %id, error = %e, "SSE session task failed");
                }
            }
            Some(Err(e)) => warn!(session_id = %id, error = %e, "SSE session failed to initialize"),
            None => debug!(session_id = %id, "SSE session cancelled before initialize"),
        }
        sessions.write().await.remove(&id);
        info!(session_id = %id, "SSE session closed");
    });

    let endpoint = Event::default()
        .event("endpoint")
        .data(endpoint_url(&state.base_url, &session_id));
    let messages = ReceiverStream::new(outbound_rx).filter_map(|message| async move {
        match serde_json::to_string(&message) {
            Ok(data) => Some(Event::default().event("message").data(data)),
            Err(e) => {
                warn!(error = %e, "Dropping unserializable server message");
                None
            }
        }
    });

    let events = stream::once(async move { endpoint })
        .chain(messages)
        .map(move |event| {
            let _session = &disconnect;
            Ok::<_, Infallible>(event)
        })
        .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Carry the HTTP request parts with the message so the handler can read
/// the caller's credential, exactly as the streamable binding does.
fn attach_parts(message: &mut ClientJsonRpcMessage, parts: http::request::Parts) {
    match message {
        JsonRpcMessage::Request(req) => {
            req.request.extensions_mut().insert(parts);
        }
        JsonRpcMessage::Notification(notification) => {
            notification.notification.extensions_mut().insert(parts);
        }
        _ => {}
    }
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    request: Request,
) -> StatusCode {
    let Some(sender) = state.sessions.read().await.get(&query.session_id).cloned() else {
        debug!(session_id = %query.session_id, "Message for unknown SSE session");
        return StatusCode::NOT_FOUND;
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_MESSAGE_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    let mut message: ClientJsonRpcMessage = match serde_json::from_slice(&bytes) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "Malformed JSON-RPC message");
            return StatusCode::BAD_REQUEST;
        }
    };
    attach_parts(&mut message, parts);

    if sender.send(message).await.is_err() {
        return StatusCode::GONE;
    }
    StatusCode::ACCEPTED
}
