use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::CompletionBackend;

/// Client for an OpenAI-compatible chat-completions endpoint
/// (vLLM, LM Studio, llama.cpp server, the public OpenAI API, ...)
pub struct ChatClient {
    /// Full URL of the completions route
    endpoint: String,
    /// HTTP client for making requests
    client: Client,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Chat-completion request payload
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier to route the request to
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat-completion response payload
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices, first one carries the answer
    pub choices: Vec<ChatChoice>,
}

/// A single completion choice
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated assistant message
    pub message: ChatMessage,
}

/// Builder methods for ChatRequest
impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl ChatClient {
    /// Create a new client for the given completions URL.
    ///
    /// The timeout covers the whole request; translation of a long snippet on
    /// a busy model server can legitimately take minutes.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Submit one request and return the raw assistant message content.
    ///
    /// A 200 body that fails the strict schema is re-read leniently through
    /// `serde_json::Value` before giving up; if the content path is still
    /// missing, the full body travels back in `ParseError` for salvage.
    async fn complete_once(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Completion API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!(
                "Failed to get response text: {}", e
            )))?;

        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(parsed) => match parsed.choices.into_iter().next() {
                Some(choice) => Ok(choice.message.content),
                None => {
                    error!("Completion response contained no choices");
                    Err(ProviderError::ParseError(body))
                }
            },
            Err(e) => {
                error!(
                    "Failed to parse completion response: {}. Raw response (first 500 chars): {}",
                    e,
                    if body.chars().count() > 500 {
                        body.chars().take(500).collect::<String>()
                    } else {
                        body.clone()
                    }
                );

                // Lenient second pass: walk choices[0].message.content by hand
                // in case the endpoint added or renamed sibling fields.
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
                    if let Some(content) = value
                        .get("choices")
                        .and_then(|c| c.get(0))
                        .and_then(|c| c.get("message"))
                        .and_then(|m| m.get("content"))
                        .and_then(|v| v.as_str())
                    {
                        return Ok(content.to_string());
                    }
                }

                Err(ProviderError::ParseError(body))
            }
        }
    }

    /// Probe the endpoint with a minimal request.
    pub async fn test_connection(&self, model: &str) -> Result<()> {
        let request = ChatRequest::new(model, vec![ChatMessage::user("Hello")]).max_tokens(10);
        self.complete_once(&request)
            .await
            .map_err(|e| anyhow!("Completion endpoint check failed: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        self.complete_once(&request).await
    }
}
