use crate::types::{CompletionConfig, PipelineError, ResponseShape, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A single system+user completion round trip. Implementations know nothing
/// about posts; retries are layered on top by `RetryingCaller`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Name used in log lines
    fn backend_name(&self) -> String;

    /// Send one request and return the assistant text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: CompletionBackend + ?Sized> CompletionBackend for Arc<T> {
    fn backend_name(&self) -> String {
        (**self).backend_name()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        (**self).complete(system_prompt, user_prompt).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

const CONTENT_POINTER: &str = "/choices/0/message/content";

impl ResponseShape {
    fn extract(self, body: Value) -> Option<String> {
        match self {
            ResponseShape::Chat => {
                let response: CompletionResponse = serde_json::from_value(body).ok()?;
                response.choices.into_iter().next()?.message?.content
            }
            ResponseShape::Legacy => body
                .pointer(CONTENT_POINTER)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    endpoint: Url,
    model: String,
    shape: ResponseShape,
}

impl OpenAiClient {
    pub fn new(api_key: &str, config: &CompletionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: Url::parse(&config.base_url)?.join("chat/completions")?,
            model: config.model.clone(),
            shape: config.response_shape,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn backend_name(&self) -> String {
        format!("openai ({}, {:?})", self.model, self.shape)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        debug!(model = %self.model, "Completion request");

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        self.shape.extract(body).ok_or_else(|| {
            PipelineError::MalformedResponse("no assistant text in response".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT_BODY: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "Moonrise"}, "finish_reason": "stop"}
        ]
    }"#;

    fn decode(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn chat_body_reads_under_both_shapes() {
        assert_eq!(ResponseShape::Chat.extract(decode(CHAT_BODY)), Some("Moonrise".to_string()));
        assert_eq!(ResponseShape::Legacy.extract(decode(CHAT_BODY)), Some("Moonrise".to_string()));
    }

    #[test]
    fn legacy_shape_only_needs_the_content_path() {
        let body = decode(r#"{"choices":[{"message":{"content":"Moonrise"}},"partial"]}"#);
        assert_eq!(ResponseShape::Chat.extract(body.clone()), None);
        assert_eq!(ResponseShape::Legacy.extract(body), Some("Moonrise".to_string()));
    }

    #[test]
    fn missing_content_extracts_nothing() {
        for shape in [ResponseShape::Chat, ResponseShape::Legacy] {
            assert_eq!(shape.extract(decode(r#"{"choices":[{"text":"Moonrise"}]}"#)), None);
            assert_eq!(shape.extract(decode(r#"{"choices":[]}"#)), None);
        }
    }

    #[test]
    fn request_serializes_system_then_user() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "usr" },
            ],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
    }

    #[test]
    fn endpoint_is_chat_completions() {
        let client = OpenAiClient::new("sk-test", &CompletionConfig::default()).unwrap();
        assert_eq!(client.endpoint.as_str(), "https://api.openai.com/v1/chat/completions");
    }
}
