//! Conversational session over a generative model.
//!
//! The session keeps the full turn history client-side and resends it with
//! every message, so each submission is a new turn appended to the same
//! conversation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One ordered piece of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Image bytes embedded in the request, base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// A single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// A hosted model that answers a conversation with text.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate the next model turn for `contents` (oldest first).
    async fn generate(&self, contents: &[Content]) -> Result<String, ServiceError>;
}

/// Stateful conversation with a model.
pub struct ChatSession {
    model: Arc<dyn GenerativeModel>,
    history: Vec<Content>,
}

impl ChatSession {
    /// Start a session with empty history.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    /// Send one user turn. History only grows when the model answers.
    pub async fn send_message(&mut self, parts: Vec<Part>) -> Result<String, ServiceError> {
        let turn = Content {
            role: Role::User,
            parts,
        };

        let mut contents = Vec::with_capacity(self.history.len() + 1);
        contents.extend_from_slice(&self.history);
        contents.push(turn);

        let text = self.model.generate(&contents).await?;

        // contents already holds history + the new user turn
        self.history = contents;
        self.history.push(Content {
            role: Role::Model,
            parts: vec![Part::text(text.clone())],
        });
        debug!(turns = self.history.len(), "Session history extended");

        Ok(text)
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Number of user turns answered so far.
    pub fn user_turns(&self) -> usize {
        self.history.iter().filter(|c| c.role == Role::User).count()
    }
}
