//! REST + SSE transport over the game service.
//!
//! Routes mirror the canonical client contract:
//! - `POST /api/game` creates a session
//! - `GET /api/game/{id}` fetches one session
//! - `PUT /api/game/{id}` applies a move (and the bot reply in AI mode)
//! - `GET /api/game/history` lists completed sessions
//! - `GET /api/game/{id}/stream` streams full session snapshots as SSE
//!
//! Success bodies are wrapped as `{"data": ...}`, failures as
//! `{"error": "..."}`.

use crate::error::GameError;
use crate::game::{Difficulty, GameMode};
use crate::service::GameService;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Heartbeat interval for idle SSE connections.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Request body for `POST /api/game`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Play mode.
    pub mode: GameMode,
    /// Bot difficulty; only meaningful in AI mode, defaults to hard.
    #[serde(default)]
    pub ai_difficulty: Option<Difficulty>,
}

/// Request body for `PUT /api/game/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MakeMoveRequest {
    /// Board position to play (0-8).
    pub position: usize,
}

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
struct DataBody<T> {
    data: T,
}

/// Failure envelope: `{"error": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match self {
            GameError::NotFound { .. } => StatusCode::NOT_FOUND,
            GameError::Conflict { .. } => StatusCode::CONFLICT,
            GameError::InvalidState { .. } | GameError::IllegalMove { .. } => {
                StatusCode::BAD_REQUEST
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router over a shared service.
pub fn router(service: GameService) -> Router {
    Router::new()
        .route("/api/game", post(create_game))
        .route("/api/game/history", get(get_history))
        .route("/api/game/{id}", get(get_game).put(make_move))
        .route("/api/game/{id}/stream", get(stream_game))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// POST /api/game
async fn create_game(
    State(service): State<GameService>,
    Json(req): Json<CreateGameRequest>,
) -> Result<Response, GameError> {
    info!(mode = ?req.mode, difficulty = ?req.ai_difficulty, "Creating game");
    let session = service.create_session(req.mode, req.ai_difficulty)?;
    Ok((StatusCode::CREATED, Json(DataBody { data: session })).into_response())
}

/// GET /api/game/{id}
async fn get_game(
    State(service): State<GameService>,
    Path(id): Path<String>,
) -> Result<Response, GameError> {
    let session = service.get_session(&id)?;
    Ok(Json(DataBody { data: session }).into_response())
}

/// PUT /api/game/{id}
async fn make_move(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(req): Json<MakeMoveRequest>,
) -> Result<Response, GameError> {
    debug!(session_id = %id, position = req.position, "Processing move");
    let session = service.apply_move(&id, req.position)?;
    Ok(Json(DataBody { data: session }).into_response())
}

/// GET /api/game/history
async fn get_history(State(service): State<GameService>) -> Response {
    let history = service.history();
    Json(DataBody { data: history }).into_response()
}

/// GET /api/game/{id}/stream
///
/// Emits the current snapshot immediately, then one event per published
/// update, each carrying the full session as JSON. Heartbeat comments
/// keep idle connections alive; when the client disconnects the stream
/// is dropped, which drops the subscription and unsubscribes the
/// watcher.
async fn stream_game(
    State(service): State<GameService>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GameError> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();

    // Subscribe before reading the initial snapshot so a move landing
    // in between is pushed rather than lost. The gate keeps pushed
    // updates queued behind the initial snapshot, so the feed never
    // goes backwards; a duplicate snapshot is harmless.
    let gate = Arc::new(std::sync::Mutex::new(()));

    let updates = tx.clone();
    let update_gate = Arc::clone(&gate);
    let subscription = service.subscribe(&id, move |snapshot| {
        let _order = update_gate.lock().expect("stream gate poisoned");
        match snapshot_event(snapshot) {
            Some(event) => updates.send(event).is_ok(),
            None => true,
        }
    })?;

    {
        let _order = gate.lock().expect("stream gate poisoned");
        let session = service.get_session(&id)?;
        if let Some(event) = snapshot_event(&session) {
            let _ = tx.send(event);
        }
    }

    info!(session_id = %id, "SSE watcher attached");

    let stream = UnboundedReceiverStream::new(rx).map(move |event| {
        // Keep the subscription alive for the lifetime of the stream.
        let _ = &subscription;
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat")))
}

fn snapshot_event(session: &crate::session::GameSession) -> Option<Event> {
    match serde_json::to_string(session) {
        Ok(json) => Some(Event::default().data(json)),
        Err(err) => {
            warn!(session_id = %session.id, error = %err, "Failed to serialize snapshot");
            None
        }
    }
}
