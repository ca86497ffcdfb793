use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::constants;
use crate::transcript::Turn;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("language model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("language model returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Text shown to the user in place of the model's reply.
    pub fn warning_text(&self) -> String {
        match self {
            GatewayError::InvalidResponse(_) => format!(
                "{} Language model returned an invalid response. Please ensure it's running.",
                constants::WARNING_MARKER
            ),
            other => format!("{} Language model error: {}", constants::WARNING_MARKER, other),
        }
    }
}

/// Stateless request/response access to a chat model.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError>;
}

// Structures matching Ollama's /api/chat endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool, // We want the full response, not a stream
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct OllamaGateway {
    client: Client,
    base_url: String,
    model: String,
}

impl Default for OllamaGateway {
    fn default() -> Self {
        Self::new(constants::OLLAMA_URL.as_str(), constants::CHAT_MODEL.as_str())
    }
}

impl OllamaGateway {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModelGateway for OllamaGateway {
    #[instrument(skip(self, messages), fields(model = %self.model, turns = messages.len()))]
    async fn send(&self, messages: &[Turn]) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.base_url);
        let request_payload = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_payload)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Ollama API request failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport { url, source })?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| GatewayError::InvalidResponse("missing 'message' field".to_string()))?;

        debug!(chars = content.len(), "Received Ollama response");
        Ok(content)
    }
}
