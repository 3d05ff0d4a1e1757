//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    CancelResponse, ClientConfigResponse, ErrorResponse, InputRequest, SelectInputMethodRequest,
    SendRequest, SessionResponse, SpeechRequest,
};
use super::AppState;
use crate::runtime::{DispatchError, DispatchOutcome, SessionHandle};
use crate::speech::{AudioClip, SpeechErrorKind};
use crate::state_machine::{Event, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the page
        .route("/", get(serve_page))
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // Input acquisition
        .route(
            "/api/sessions/:id/input-method",
            post(select_input_method),
        )
        .route("/api/sessions/:id/input", post(edit_input))
        .route("/api/sessions/:id/speech", post(record_speech))
        .route("/api/sessions/:id/speech/cancel", post(cancel_speech))
        // Response generation and the conversation store
        .route("/api/sessions/:id/send", post(send))
        .route("/api/sessions/:id/clear", post(clear))
        .route("/api/config", get(get_config))
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
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let handle = state.sessions.create_session().await;
    Json(SessionResponse {
        session: handle.view(),
        reload: false,
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    Ok(Json(SessionResponse {
        session: handle.view(),
        reload: false,
    }))
}

async fn lookup(state: &AppState, id: &str) -> Result<Arc<SessionHandle>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

/// Run one event and answer with the updated view
async fn apply(
    state: &AppState,
    id: &str,
    event: Event,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(state, id).await?;
    let outcome = handle.dispatch(event).await?;
    Ok(respond(&handle, outcome))
}

fn respond(handle: &SessionHandle, outcome: DispatchOutcome) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: handle.view(),
        reload: outcome.reload,
    })
}

// ============================================================
// Input acquisition
// ============================================================

async fn select_input_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectInputMethodRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, &id, Event::SelectInputMethod { method: req.method }).await
}

async fn edit_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InputRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, &id, Event::TextEdited { text: req.text }).await
}

async fn record_speech(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;

    let data = STANDARD
        .decode(req.audio.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("Invalid audio encoding: {e}")))?;
    let clip = AudioClip {
        data,
        mime_type: req.mime_type,
        sample_rate_hertz: req.sample_rate_hertz,
    };

    let outcome = handle.record_speech(clip).await?;
    Ok(respond(&handle, outcome))
}

async fn cancel_speech(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    let cancelled = handle.cancel_speech().await;
    Ok(Json(CancelResponse { cancelled }))
}

// ============================================================
// Response generation and conversation store
// ============================================================

async fn send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<SendRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    // Staging and sending share one lock so no other edit lands in between
    let mut events = Vec::with_capacity(2);
    if let Some(text) = req.text {
        events.push(Event::TextEdited { text });
    }
    events.push(Event::Send);

    let outcome = handle.dispatch_all(events).await?;
    Ok(respond(&handle, outcome))
}

async fn clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, &id, Event::Clear).await
}

// ============================================================
// Misc
// ============================================================

async fn get_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        record_window_secs: state.sessions.record_window().as_secs(),
        speech_timeout_secs: state.sessions.speech_timeout().as_secs(),
    })
}

async fn get_version() -> &'static str {
    concat!("chatbot-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// An upstream service failed to answer
    Upstream(String),
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::Transition(TransitionError::Busy) => AppError::Conflict(message),
            DispatchError::Transition(_) => AppError::BadRequest(message),
            DispatchError::Generation(_) => AppError::Upstream(message),
            DispatchError::Speech(e)
                if matches!(
                    e.kind,
                    SpeechErrorKind::DeviceUnavailable | SpeechErrorKind::ClipTooLong
                ) =>
            {
                AppError::BadRequest(message)
            }
            DispatchError::Speech(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
