/*!
 * Client implementations for the remote collaborators.
 *
 * This module contains the HTTP clients the translator talks to:
 * - `chat`: OpenAI-compatible chat-completions client (vLLM, LM Studio, ...)
 *
 * The `CompletionBackend` trait is the seam the orchestrator depends on, so
 * tests can substitute a scripted backend for the real endpoint.
 */

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::providers::chat::ChatRequest;

/// Common interface for anything that can answer a chat-completion request.
///
/// Implementations return the assistant message content as plain text; the
/// raw body of an unparseable 200 response travels inside
/// `ProviderError::ParseError` so the caller can attempt salvage.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Submit one request and return the assistant message content.
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

pub mod chat;
