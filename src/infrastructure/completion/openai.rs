//! OpenAI chat-completion provider implementation

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;

use crate::domain::completion::{
    CompletionChunk, CompletionProvider, CompletionStream, PromptMessage, PromptRole,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default completion model and sampling settings
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// OpenAI chat-completion provider
#[derive(Debug)]
pub struct OpenAiCompletionProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<C: HttpClientTrait> OpenAiCompletionProvider<C> {
    /// Create a new OpenAI completion provider with default settings
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new provider with custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the completion model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the completion token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, messages: &[PromptMessage], stream: bool) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    PromptRole::System => "system",
                    PromptRole::User => "user",
                    PromptRole::Assistant => "assistant",
                };
                serde_json::json!({ "role": role, "content": m.content })
            })
            .collect();

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> CompletionProvider for OpenAiCompletionProvider<C> {
    async fn complete(&self, messages: Vec<PromptMessage>) -> Result<String, DomainError> {
        let body = self.build_request(&messages, false);

        let response = self
            .client
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        let response: OpenAiChatResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn complete_stream(
        &self,
        messages: Vec<PromptMessage>,
    ) -> Result<CompletionStream, DomainError> {
        let body = self.build_request(&messages, true);

        let byte_stream = self
            .client
            .post_json_stream(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        let stream = byte_stream.filter_map(|result: Result<Bytes, DomainError>| async move {
            match result {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    parse_sse_chunk(&text)
                }
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Parse one SSE payload into a completion chunk. `data: [DONE]` is the
/// stream's termination sentinel.
fn parse_sse_chunk(text: &str) -> Option<Result<CompletionChunk, DomainError>> {
    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            if data.trim() == "[DONE]" {
                return Some(Ok(CompletionChunk::finished()));
            }

            if let Ok(chunk) = serde_json::from_str::<OpenAiStreamChunk>(data) {
                if let Some(choice) = chunk.choices.into_iter().next() {
                    if let Some(delta) = choice.delta.content {
                        return Some(Ok(CompletionChunk::delta(delta)));
                    }
                }
            }
        }
    }
    None
}

// OpenAI API types

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/chat/completions";

    #[tokio::test]
    async fn test_complete() {
        let mock_response = serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4.1-mini",
            "choices": [{
                "message": { "role": "assistant", "content": "Hello! How can I help you?" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18 }
        });

        let client = MockHttpClient::new().with_response(TEST_URL, mock_response);
        let provider = OpenAiCompletionProvider::new(client, "test-api-key");

        let reply = provider
            .complete(vec![PromptMessage::user("Hello!")])
            .await
            .unwrap();

        assert_eq!(reply, "Hello! How can I help you?");
    }

    #[tokio::test]
    async fn test_complete_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "API key invalid");
        let provider = OpenAiCompletionProvider::new(client, "invalid-key");

        let result = provider.complete(vec![PromptMessage::user("Hello!")]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stream_terminated_by_sentinel() {
        use futures::StreamExt;

        let chunks = vec![
            Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            ),
            Bytes::from(
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            ),
            Bytes::from("data: [DONE]\n\n"),
        ];

        let client = MockHttpClient::new().with_stream_response(TEST_URL, chunks);
        let provider = OpenAiCompletionProvider::new(client, "test-api-key");

        let mut stream = provider
            .complete_stream(vec![PromptMessage::user("Hi")])
            .await
            .unwrap();

        let mut collected = String::new();
        let mut finished = false;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            if let Some(delta) = chunk.delta {
                collected.push_str(&delta);
            }
            if chunk.finished {
                finished = true;
            }
        }

        assert_eq!(collected, "Hello");
        assert!(finished);
    }

    #[tokio::test]
    async fn test_stream_skips_malformed_payloads() {
        use futures::StreamExt;

        let chunks = vec![
            Bytes::from("data: {not json}\n\n"),
            Bytes::from("data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n"),
            Bytes::from("data: [DONE]\n\n"),
        ];

        let client = MockHttpClient::new().with_stream_response(TEST_URL, chunks);
        let provider = OpenAiCompletionProvider::new(client, "test-api-key");

        let mut stream = provider
            .complete_stream(vec![PromptMessage::user("Hi")])
            .await
            .unwrap();

        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            if let Some(delta) = chunk.unwrap().delta {
                collected.push_str(&delta);
            }
        }

        assert_eq!(collected, "ok");
    }

    #[test]
    fn test_request_carries_sampling_settings() {
        let client = MockHttpClient::new();
        let provider = OpenAiCompletionProvider::new(client, "key")
            .with_model("gpt-4.1-mini")
            .with_temperature(0.5)
            .with_max_tokens(500);

        let body = provider.build_request(&[PromptMessage::system("sys")], false);

        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
    }
}
