//! Chat-completions transport for OpenAI-compatible endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use katagen_core::error::CollaboratorError;
use katagen_core::external::{CompletionRequest, CompletionResponse, LlmClient};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// An OpenAI-compatible chat-completions client. One HTTP request per
/// completion; transport failures map to `CollaboratorError::Transport`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    headers: HashMap<String, String>,
    http_client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.4,
            max_tokens: 8_192,
            headers: HashMap::new(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CollaboratorError> {
        let body = ChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user,
                },
            ],
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.temperature)),
        };

        let mut builder = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Transport(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Transport(format!("unparsable response: {e}")))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        debug!(bytes = text.len(), "completion received");

        Ok(CompletionResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_trailing_slash() {
        let client =
            OpenAiCompatibleClient::new("https://api.example.com/v1/", None, "gpt-4o-mini");
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn request_serializes_both_messages() {
        let body = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "s".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "u".to_string(),
                },
            ],
            max_tokens: None,
            temperature: Some(0.4),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"system\""));
        assert!(json.contains("\"user\""));
        assert!(!json.contains("max_tokens"));
    }
}
