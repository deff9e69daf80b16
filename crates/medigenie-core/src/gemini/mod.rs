//! Gemini HTTP client.
//!
//! Calls `models/{model}:generateContent` on the Generative Language API.
//! The API is stateless; conversation state lives in [`crate::chat::ChatSession`].

mod wire;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::chat::{Content, GenerativeModel};
use crate::config::{GenerationConfig, Settings};
use crate::error::{MediError, MediResult, ServiceError};

use wire::{api_error, GenerateContentRequest, GenerateContentResponse};

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for one Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from loaded settings.
    pub fn new(settings: &Settings) -> MediResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| MediError::config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            api_key: settings.api_key.expose().to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            generation: settings.generation.clone(),
            client,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/{}/models/{}", self.base_url, API_VERSION, self.model)
    }

    /// Check that the key is accepted and the model exists.
    pub async fn verify(&self) -> Result<(), ServiceError> {
        let response = self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        debug!(model = %self.model, "Model verified");
        Ok(())
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, contents: &[Content]) -> Result<String, ServiceError> {
        let request = GenerateContentRequest {
            contents,
            generation_config: &self.generation,
        };

        debug!(model = %self.model, turns = contents.len(), "Calling generateContent");
        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "generateContent returned an error status");
            return Err(api_error(status.as_u16(), &body));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.into_text()?;
        debug!(chars = text.len(), "Model responded");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Part, Role};
    use crate::config::{ApiKey, FileConfig, API_KEY_ENV, BASE_URL_ENV};
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn generate(
        State(captured): State<Captured>,
        Path(target): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.requests.lock().unwrap().push((target, key.clone(), body));

        if key.as_deref() != Some("good-key") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "T"}]}, "finishReason": "STOP"}]})),
        )
    }

    async fn model_info(Path(model): Path<String>, headers: HeaderMap) -> StatusCode {
        match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            Some("good-key") if model == "gemini-test" => StatusCode::OK,
            Some("good-key") => StatusCode::NOT_FOUND,
            _ => StatusCode::FORBIDDEN,
        }
    }

    async fn spawn_stub() -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route("/v1beta/models/{target}", get(model_info).post(generate))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn client_for(base_url: &str, key: &str) -> GeminiClient {
        let file = FileConfig {
            model: Some("gemini-test".to_string()),
            ..FileConfig::default()
        };
        let base_url = base_url.to_string();
        let key = key.to_string();
        let settings = Settings::resolve(file, move |name| match name {
            API_KEY_ENV => Some(key.clone()),
            BASE_URL_ENV => Some(base_url.clone()),
            _ => None,
        })
        .unwrap();
        GeminiClient::new(&settings).unwrap()
    }

    fn user_turn() -> Vec<Content> {
        vec![Content {
            role: Role::User,
            parts: vec![
                Part::text("Analyze this medical image and provide insights."),
                Part::inline_data("image/jpeg", "/9j/AAAA"),
            ],
        }]
    }

    #[tokio::test]
    async fn test_generate_sends_expected_payload() {
        let (base_url, captured) = spawn_stub().await;
        let client = client_for(&base_url, "good-key");

        let text = client.generate(&user_turn()).await.unwrap();
        assert_eq!(text, "T");

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (target, key, body) = &requests[0];
        assert_eq!(target, "gemini-test:generateContent");
        assert_eq!(key.as_deref(), Some("good-key"));

        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "Analyze this medical image and provide insights.");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "/9j/AAAA");

        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
        assert_eq!(config["responseMimeType"], "text/plain");
    }

    #[tokio::test]
    async fn test_generate_maps_api_error() {
        let (base_url, _captured) = spawn_stub().await;
        let client = client_for(&base_url, "bad-key");

        let err = client.generate(&user_turn()).await.unwrap_err();
        match err {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"), "good-key");
        let err = client.generate(&user_turn()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }

    #[tokio::test]
    async fn test_verify() {
        let (base_url, _captured) = spawn_stub().await;
        assert!(client_for(&base_url, "good-key").verify().await.is_ok());

        let err = client_for(&base_url, "bad-key").verify().await.unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 403, .. }));
    }

    #[test]
    fn test_client_does_not_leak_key_in_model_url() {
        let settings = Settings {
            api_key: ApiKey::new("secret").unwrap(),
            model: "gemini-test".to_string(),
            base_url: "https://example.invalid".to_string(),
            request_timeout: Settings::DEFAULT_REQUEST_TIMEOUT,
            session_ttl: Settings::DEFAULT_SESSION_TTL,
            max_upload_bytes: Settings::DEFAULT_MAX_UPLOAD_BYTES,
            generation: GenerationConfig::default(),
        };
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(client.model_url(), "https://example.invalid/v1beta/models/gemini-test");
        assert!(!client.model_url().contains("secret"));
    }
}
