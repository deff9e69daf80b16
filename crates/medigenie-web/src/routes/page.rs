//! The single page: upload form, preview and analysis result.

use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use medigenie_core::{AnalysisResult, Outcome};
use tracing::error;

use super::form::read_submission;
use crate::session::{session_cookie, session_id};
use crate::state::AppState;

const RENDER_FAILED_MESSAGE: &str = "The page could not be displayed. Please try again.";

#[derive(Template, Default)]
#[template(path = "index.html")]
struct IndexTemplate {
    model_name: String,
    preview: Option<String>,
    filename: Option<String>,
    warning: Option<String>,
    analysis: Option<String>,
    failure: Option<String>,
}

impl IndexTemplate {
    fn empty(state: &AppState) -> Self {
        Self {
            model_name: state.model_name.to_string(),
            ..Self::default()
        }
    }

    fn with_outcome(mut self, outcome: Outcome) -> Self {
        if let Some(image) = &outcome.image {
            self.preview = Some(image.data_url());
            self.filename = image.filename().map(str::to_string);
        }
        match outcome.result {
            AnalysisResult::Success { text } => self.analysis = Some(text),
            AnalysisResult::ValidationError { message } => self.warning = Some(message),
            AnalysisResult::RequestError { message } => self.failure = Some(message),
        }
        self
    }
}

fn render(template: impl Template) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(RENDER_FAILED_MESSAGE)).into_response()
        }
    }
}

/// GET / - Render the empty page.
pub async fn index(State(state): State<AppState>) -> Response {
    render(IndexTemplate::empty(&state))
}

/// POST /analyze - Run the submission for this visitor and re-render the page.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let form = match read_submission(multipart).await {
        Ok(form) => form,
        Err(e) => return (e.status(), Html(e.body_text())).into_response(),
    };

    let known = session_id(&headers);
    let (id, handler) = state.sessions.acquire(known);

    let outcome = handler
        .lock()
        .await
        .handle_submission(form.trigger, form.upload)
        .await;

    let template = match outcome {
        Some(outcome) => IndexTemplate::empty(&state).with_outcome(outcome),
        None => IndexTemplate::empty(&state),
    };

    let mut response = render(template);
    if known != Some(id) {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, session_cookie(id));
    }
    response
}
