use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solace_core::chat::Message;
use solace_core::fallback::FallbackResponder;

use super::error::UpstreamError;
use crate::config::OpenAiConfig;

const SYSTEM_PROMPT: &str = "You are a supportive mental health assistant. Provide empathetic, \
     helpful responses while making it clear you are not a replacement for professional mental \
     health care.";

/// How many of the session's latest messages are sent as conversation context.
const CONTEXT_MESSAGES: usize = 12;

/// Source of assistant replies.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Produce a reply to the conversation so far. The last entry of
    /// `history` is the user message being answered.
    async fn reply(&self, history: &[Message]) -> Result<String, UpstreamError>;
}

/// Canned replies from the shared [`FallbackResponder`] rotation.
#[derive(Clone)]
pub struct RotatingReplies {
    responder: Arc<FallbackResponder>,
}

impl RotatingReplies {
    pub fn new(responder: Arc<FallbackResponder>) -> Self {
        Self { responder }
    }

    pub fn next(&self) -> &'static str {
        self.responder.next()
    }
}

#[async_trait]
impl ReplyProvider for RotatingReplies {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn reply(&self, _history: &[Message]) -> Result<String, UpstreamError> {
        Ok(self.next().to_string())
    }
}

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiReplies {
    client: reqwest::Client,
    config: OpenAiConfig,
    timeout: Duration,
}

impl OpenAiReplies {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    fn request_body<'a>(&'a self, history: &'a [Message]) -> CompletionRequest<'a> {
        let start = history.len().saturating_sub(CONTEXT_MESSAGES);
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(CompletionMessage {
            role: "system",
            content: SYSTEM_PROMPT,
        });
        messages.extend(history[start..].iter().map(|m| CompletionMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl ReplyProvider for OpenAiReplies {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn reply(&self, history: &[Message]) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(history))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout(self.timeout)
                } else {
                    UpstreamError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        extract_reply(completion)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_reply(completion: CompletionResponse) -> Result<String, UpstreamError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| UpstreamError::Malformed("completion has no text".to_string()))
}
