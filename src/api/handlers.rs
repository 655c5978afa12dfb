//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::{sse_stream, state_to_json};
use super::types::{
    ErrorResponse, StartRequest, StartResponse, StateResponse, SuccessResponse, TopicResponse,
    TopicsResponse,
};
use super::AppState;
use crate::debate::{Event, TransitionError};
use crate::runtime::{DispatchError, SseEvent};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the debate page
        .route("/", get(serve_page))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        .route("/api/topics", get(list_topics))
        // Page actions
        .route("/api/debate/start", post(start_debate))
        .route("/api/debate/reset", post(reset_debate))
        .route("/api/debate/state", get(get_state))
        // SSE streaming
        .route("/api/debate/stream", get(stream_debate))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - debate page not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Topics
// ============================================================

async fn list_topics(State(state): State<AppState>) -> Json<TopicsResponse> {
    let topics = state
        .config
        .topics
        .iter()
        .map(|t| TopicResponse {
            id: t.id.clone(),
            display_name: t.display_name.clone(),
        })
        .collect();

    Json(TopicsResponse {
        variant: state.config.variant.clone(),
        topics,
    })
}

// ============================================================
// Page Actions
// ============================================================

async fn start_debate(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, AppError> {
    let session_id = uuid::Uuid::new_v4().to_string();

    state
        .debate
        .dispatch(Event::ChooseTopic {
            topic_id: req.topic_id,
            session_id: session_id.clone(),
            requested_at: Utc::now(),
        })
        .await?;

    Ok(Json(StartResponse { session_id }))
}

async fn reset_debate(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.debate.dispatch(Event::Reset).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let debate = state.debate.state();
    let page = state.debate.display.snapshot();
    let session = debate.session();

    Json(StateResponse {
        status: debate.status(),
        session_id: session.map(|s| s.id.clone()),
        topic: session.map(|s| s.topic.display_name.clone()),
        exchanges: session.map_or(0, |s| s.exchanges),
        exchange_threshold: state.config.exchange_threshold,
        controls: page.controls,
        loading: page.loading,
        state: state_to_json(&debate),
    })
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_debate(State(state): State<AppState>) -> impl IntoResponse {
    let (page, broadcast_rx) = state.debate.display.subscribe();

    // Mark the current value seen so only later changes are streamed
    let mut state_rx = state.debate.state_rx.clone();
    let current = state_rx.borrow_and_update().clone();

    let init_event = SseEvent::Init {
        markup: page.markup(),
        controls: page.controls,
        loading: page.loading,
        state: state_to_json(&current),
    };

    sse_stream(init_event, broadcast_rx, state_rx)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("debate-arena ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Rejected(e @ TransitionError::UnknownTopic(_)) => {
                AppError::NotFound(e.to_string())
            }
            DispatchError::Rejected(e @ TransitionError::DebateInProgress) => {
                AppError::Conflict(e.to_string())
            }
            DispatchError::Rejected(e) => AppError::BadRequest(e.to_string()),
            DispatchError::Stopped => AppError::Internal(DispatchError::Stopped.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
