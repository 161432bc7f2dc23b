//! Chat completion service
//!
//! Wraps an OpenAI-compatible chat completions endpoint. Both the route
//! ordering step and the schedule chat go through this trait; tests use
//! the scripted mock.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ChatMessage;

/// Chat completion service trait
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produce a single text completion for the given conversation
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// OpenAI-compatible client configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL up to the API version, e.g. "https://api.openai.com/v1"
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl OpenAiConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_seconds: 30,
        }
    }
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens,
            temperature,
        };

        debug!(
            "Requesting completion from {} ({} messages)",
            self.config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API returned error {}: {}", status, body);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .context("Completion response contained no choices")?;

        Ok(choice.message.content)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

/// Scripted completion service for tests. Replies are returned in FIFO
/// order; running out of replies is an error.
pub struct MockCompletionService {
    replies: Mutex<VecDeque<String>>,
}

impl MockCompletionService {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    /// A mock that fails every call, for error-path tests
    pub fn failing() -> Self {
        Self::new(Vec::<String>::new())
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String> {
        self.replies
            .lock()
            .expect("mock replies lock")
            .pop_front()
            .context("Mock completion service has no scripted reply")
    }

    fn name(&self) -> &str {
        "MockCompletion"
    }
}
