//! JSON API route handlers.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use medigenie_core::{AnalysisResult, Outcome};
use serde::Serialize;

use super::form::read_submission;
use crate::session::{session_cookie, session_id};
use crate::state::AppState;

#[derive(Serialize, Debug)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub user_turns: usize,
}

impl AnalyzeResponse {
    fn from_outcome(outcome: Outcome, user_turns: usize) -> (StatusCode, Self) {
        let status = outcome.result.status();
        let mime_type = outcome.image.map(|img| img.mime_type());
        let (code, text, message) = match outcome.result {
            AnalysisResult::Success { text } => (StatusCode::OK, Some(text), None),
            AnalysisResult::ValidationError { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, None, Some(message))
            }
            AnalysisResult::RequestError { message } => (StatusCode::BAD_GATEWAY, None, Some(message)),
        };
        (
            code,
            Self {
                status,
                text,
                message,
                mime_type,
                user_turns,
            },
        )
    }
}

#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub user_turns: usize,
}

/// POST /api/analyze - Multipart submission, JSON outcome.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let form = match read_submission(multipart).await {
        Ok(form) => form,
        Err(e) => return (e.status(), e.body_text()).into_response(),
    };

    let known = session_id(&headers);
    let (id, handler) = state.sessions.acquire(known);

    let mut response = {
        let mut handler = handler.lock().await;
        match handler.handle_submission(form.trigger, form.upload).await {
            Some(outcome) => {
                let turns = handler.session().user_turns();
                let (code, body) = AnalyzeResponse::from_outcome(outcome, turns);
                (code, Json(body)).into_response()
            }
            None => StatusCode::NO_CONTENT.into_response(),
        }
    };

    if known != Some(id) {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, session_cookie(id));
    }
    response
}

/// GET /api/session - Turn count for the caller's session.
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let handler = session_id(&headers)
        .and_then(|id| state.sessions.get(id))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No active session".to_string()))?;

    let user_turns = handler.lock().await.session().user_turns();
    Ok(Json(SessionResponse { user_turns }))
}

/// DELETE /api/session - End the caller's session.
pub async fn delete_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    match session_id(&headers) {
        Some(id) if state.sessions.remove(id) => StatusCode::NO_CONTENT,
        _ => StatusCode::NOT_FOUND,
    }
}
