//! Inbound HTTP surface.
//!
//! One route: `POST /api/chat` with `{prompt, context?}`. Session identity
//! is verified upstream (auth collaborator / reverse proxy); this binary
//! only checks that the identity header is present. Every turn outcome is
//! relayed as a chunked body over one channel-backed sink, so the client
//! never has to branch on response shape.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use nova_core::{
    ChatBackend, ChatTurn, ChunkSink, Orchestrator, ProviderClient, RelayConfig, ResponseCache,
    SinkClosed, StreamChunk, ToolDispatcher,
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Externally-verified session identity, injected by the auth collaborator.
const SESSION_HEADER: &str = "x-session-user";

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    has_api_key: bool,
}

/// Forwards chunks into the response body channel. The bounded channel is
/// the backpressure point: a slow client pauses the upstream read loop.
struct ChannelSink {
    tx: mpsc::Sender<String>,
}

#[async_trait::async_trait]
impl ChunkSink for ChannelSink {
    async fn accept(&mut self, chunk: StreamChunk) -> Result<(), SinkClosed> {
        self.tx.send(chunk.delta).await.map_err(|_| SinkClosed)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,nova_core=info,nova_gateway=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = RelayConfig::load();
    if config.api_keys.is_empty() {
        warn!(target: "gateway", "No API key configured; chat requests will be rejected");
    }

    let cache = Arc::new(ResponseCache::new());
    let dispatcher = ToolDispatcher::from_config(&config, Arc::clone(&cache));
    let backend: Arc<dyn ChatBackend> = Arc::new(ProviderClient::new(&config)?);
    let orchestrator = Arc::new(Orchestrator::new(&config, backend, dispatcher));

    let state = AppState {
        orchestrator,
        has_api_key: !config.api_keys.is_empty(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    info!(target: "gateway", addr = %config.bind_addr, "Starting gateway");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(turn): Json<ChatTurn>,
) -> Response {
    if headers.get(SESSION_HEADER).is_none() {
        return error_response(StatusCode::UNAUTHORIZED, "Authentication required.");
    }
    if !state.has_api_key {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API key is not configured on the server.",
        );
    }
    if turn.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is empty.");
    }

    let (tx, rx) = mpsc::channel::<String>(32);
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        let mut sink = ChannelSink { tx };
        match orchestrator.run_turn(&turn, &mut sink).await {
            Ok(outcome) => info!(target: "gateway", outcome = ?outcome, "Turn finished"),
            Err(e) => warn!(target: "gateway", error = %e, "Turn failed"),
        }
        // Dropping the sender closes the response body.
    });

    let stream = ReceiverStream::new(rx).map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)));

    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
