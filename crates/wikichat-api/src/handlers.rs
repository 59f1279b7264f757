//! Route handler functions for all endpoints.
//!
//! Each handler extracts path/query/body parameters via axum extractors,
//! calls the chat orchestrator, and returns JSON.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wikichat_chat::{Submission, TranscriptView};

use crate::error::ApiError;
use crate::state::AppState;
use crate::ui::CHAT_HTML;

// =============================================================================
// Request types
// =============================================================================

/// Query parameters for POST /api/sessions.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionParams {
    /// Existing session to resume, if the client has one.
    pub resume: Option<Uuid>,
}

/// Body for POST /api/sessions/{id}/messages.
///
/// Exactly one of `text` or `example` must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRequest {
    pub text: Option<String>,
    pub example: Option<usize>,
}

impl TryFrom<MessageRequest> for Submission {
    type Error = ApiError;

    fn try_from(req: MessageRequest) -> Result<Self, Self::Error> {
        match (req.text, req.example) {
            (Some(text), None) => Ok(Submission::FreeText(text)),
            (None, Some(index)) => Ok(Submission::Example(index)),
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "Send either 'text' or 'example', not both".to_string(),
            )),
            (None, None) => Err(ApiError::BadRequest(
                "One of 'text' or 'example' is required".to_string(),
            )),
        }
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: u64,
}

/// Static page content for the chat UI.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub title: String,
    pub icon: String,
    pub info: String,
    pub pill_prompt: String,
    pub input_placeholder: String,
    pub examples: Vec<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - the chat page.
pub async fn index() -> impl IntoResponse {
    Html(CHAT_HTML)
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.session_count() as u64,
    })
}

/// GET /api/page - title, banner, and example questions.
pub async fn page(State(state): State<AppState>) -> Json<PageResponse> {
    let page = &state.config.page;
    Json(PageResponse {
        title: page.title.clone(),
        icon: page.icon.clone(),
        info: page.info.clone(),
        pill_prompt: page.pill_prompt.clone(),
        input_placeholder: page.input_placeholder.clone(),
        examples: state.orchestrator.examples().as_slice().to_vec(),
    })
}

/// POST /api/sessions - start (or resume) a session.
pub async fn create_session(
    State(state): State<AppState>,
    params: Result<Query<CreateSessionParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let view = state.orchestrator.ensure_transcript(params.resume).await?;
    let status = if Some(view.session_id) == params.resume {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(view)))
}

/// GET /api/sessions/{id} - the session's transcript.
pub async fn get_session(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TranscriptView>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.orchestrator.render_transcript(id).await?))
}

/// DELETE /api/sessions/{id} - end a session.
pub async fn delete_session(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.orchestrator.delete_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/{id}/messages - ask a question.
pub async fn post_message(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<TranscriptView>, ApiError> {
    let Path(id) = id?;
    let Json(request) = body?;
    let submission = Submission::try_from(request)?;
    Ok(Json(state.orchestrator.handle_submission(id, submission).await?))
}
