//! Chat relay between avatar clients and an inference backend.
//!
//! ## Endpoints
//!
//! - `POST /chat` (HTTP) with `{"message": ...}` answers `{"reply": ...}`
//! - `GET /health` (HTTP) answers `{"status": "ok"}`
//! - both HTTP routes answer CORS preflights for any origin
//! - WebSocket on its own port: `user_message` frames in, `avatar_speech`
//!   frames out

use super::backend::InferenceBackend;
use super::protocol::{
    ChatReply, ChatRequest, ErrorReply, HealthReply, Inbound, RelayMessage, parse_inbound,
};
use crate::config::RelayConfig;
use crate::error::{AvatarError, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::tungstenite::Message;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Body of the HTTP 500 returned when the backend fails.
pub const INFERENCE_FAILED: &str = "inference request failed";

#[derive(Clone)]
struct AppState {
    backend: Arc<dyn InferenceBackend>,
}

/// The running relay: one HTTP listener and one WebSocket listener.
pub struct RelayServer {
    http_addr: SocketAddr,
    ws_addr: SocketAddr,
    http: JoinHandle<()>,
    ws: JoinHandle<()>,
}

impl RelayServer {
    /// Bind both listeners and start serving in background tasks.
    ///
    /// Port `0` in either slot picks a free port; see
    /// [`http_addr`](Self::http_addr) and [`ws_addr`](Self::ws_addr).
    ///
    /// # Errors
    ///
    /// Returns [`AvatarError::Relay`] if a listener cannot bind.
    pub async fn start(config: &RelayConfig, backend: Arc<dyn InferenceBackend>) -> Result<Self> {
        let http_listener = bind(&config.host, config.http_port).await?;
        let ws_listener = bind(&config.host, config.ws_port).await?;
        let http_addr = local_addr(&http_listener)?;
        let ws_addr = local_addr(&ws_listener)?;

        let app = router(Arc::clone(&backend));
        let http = tokio::spawn(async move {
            if let Err(e) = axum::serve(http_listener, app).await {
                tracing::error!("relay HTTP server error: {e}");
            }
        });
        let ws = tokio::spawn(accept_loop(ws_listener, backend));

        info!("relay HTTP listening on http://{http_addr}");
        info!("relay WebSocket listening on ws://{ws_addr}");
        Ok(Self {
            http_addr,
            ws_addr,
            http,
            ws,
        })
    }

    /// Bound HTTP address.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Bound WebSocket address.
    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    /// `ws://` URL clients should connect to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.ws_addr)
    }

    /// Abort both listeners and every open WebSocket connection.
    pub fn shutdown(&self) {
        self.http.abort();
        self.ws.abort();
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// HTTP routes over `backend`, open to browser clients on any origin.
pub fn router(backend: Arc<dyn InferenceBackend>) -> Router {
    Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { backend })
}

async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| AvatarError::Relay(format!("bind {addr} failed: {e}")))
}

fn local_addr(listener: &TcpListener) -> Result<SocketAddr> {
    listener
        .local_addr()
        .map_err(|e| AvatarError::Relay(format!("failed to get local addr: {e}")))
}

async fn handle_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    match state.backend.generate(&req.message).await {
        Ok(reply) => Json(ChatReply { reply }).into_response(),
        Err(e) => {
            warn!("chat request failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorReply {
                    error: INFERENCE_FAILED.to_owned(),
                }),
            )
                .into_response()
        }
    }
}

async fn handle_health() -> Json<HealthReply> {
    Json(HealthReply {
        status: "ok".to_owned(),
    })
}

/// Accept WebSocket clients until aborted. Connections live in a `JoinSet`
/// so aborting this task closes them too.
async fn accept_loop(listener: TcpListener, backend: Arc<dyn InferenceBackend>) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(serve_connection(stream, peer, Arc::clone(&backend)));
                }
                Err(e) => warn!("relay accept failed: {e}"),
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, backend: Arc<dyn InferenceBackend>) {
    let id = Uuid::new_v4();
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!(%id, %peer, "websocket handshake failed: {e}");
            return;
        }
    };
    info!(%id, %peer, "avatar connected");
    let (mut write, mut read) = ws.split();

    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(%id, "websocket read error: {e}");
                break;
            }
        };

        let prompt = match parse_inbound(&text) {
            Inbound::Prompt(prompt) => prompt,
            Inbound::Ignore => {
                debug!(%id, "ignoring frame");
                continue;
            }
        };

        let reply = match backend.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%id, "inference failed: {e}");
                continue;
            }
        };

        let frame = match serde_json::to_string(&RelayMessage::AvatarSpeech { text: reply }) {
            Ok(json) => json,
            Err(e) => {
                warn!(%id, "cannot encode reply: {e}");
                continue;
            }
        };
        if let Err(e) = write.send(Message::Text(frame)).await {
            debug!(%id, "websocket send failed: {e}");
            break;
        }
    }
    info!(%id, "avatar disconnected");
}
