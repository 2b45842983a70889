/*!
 * The request orchestrator: one `TranslationResult` per `TranslationRequest`.
 *
 * Builds the chat payload from a prompt profile, submits it with bounded
 * retries and exponential backoff, and routes the raw answer through the
 * extraction cascade. All failures are per-request; the caller decides what
 * to do with a failed row.
 */

use std::time::Duration;

use log::{debug, warn};

use crate::errors::ProviderError;
use crate::extraction::{ExtractionMode, extract_translated_code};
use crate::providers::CompletionBackend;
use crate::providers::chat::{ChatMessage, ChatRequest};
use crate::translation::prompts::PromptProfile;

/// Fixed marker prefixing every diagnostic written in place of code, so a
/// failed row can never be mistaken for a translation downstream.
pub const ERROR_MARKER: &str = "! Error:";

/// Outcome classification for a single translated row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    /// Extraction produced usable code
    Ok,
    /// Response received but no strategy recovered content
    ParseFailed,
    /// Transport failed after exhausting the retry budget
    NetworkFailed,
    /// Source snippet was blank; no request was made
    Empty,
}

/// Input for one translation: immutable once built, one per row.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// The legacy Fortran/ESOPE snippet to translate
    pub source_snippet: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token ceiling when the profile uses a fixed budget
    pub max_tokens: u32,
}

/// Outcome of one translation
#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// Extracted code on success, marked diagnostic text on failure
    pub extracted_code: String,
    /// Raw model output, retained for diagnostics
    pub raw_response: String,
    /// Outcome classification
    pub status: TranslationStatus,
}

impl TranslationResult {
    fn ok(code: String, raw: String) -> Self {
        Self { extracted_code: code, raw_response: raw, status: TranslationStatus::Ok }
    }

    fn empty() -> Self {
        Self {
            extracted_code: String::new(),
            raw_response: String::new(),
            status: TranslationStatus::Empty,
        }
    }

    fn failed(status: TranslationStatus, diagnostic: String, raw: String) -> Self {
        Self {
            extracted_code: format!("{} {}", ERROR_MARKER, diagnostic),
            raw_response: raw,
            status,
        }
    }

    /// Whether the extracted text is real code rather than a diagnostic
    pub fn is_ok(&self) -> bool {
        matches!(self.status, TranslationStatus::Ok | TranslationStatus::Empty)
    }
}

/// Retry policy for the completion call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (not retries), minimum 1
    pub max_attempts: u32,
    /// Base backoff delay; doubles after every failed attempt
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_base: Duration::from_millis(1000) }
    }
}

impl RetryPolicy {
    /// Backoff before the given 1-based retry (1 -> base, 2 -> 2*base, ...)
    fn delay_before_retry(&self, retry: u32) -> Duration {
        self.backoff_base * (1u32 << (retry - 1).min(16))
    }
}

/// Translates one snippet at a time through a completion backend.
///
/// The profile supplies the prompts, the token policy, and the extraction
/// mode, so differently-flavoured pipelines share this single implementation.
pub struct Translator<B: CompletionBackend> {
    backend: B,
    model: String,
    profile: PromptProfile,
    retry: RetryPolicy,
}

impl<B: CompletionBackend> Translator<B> {
    /// Create a translator with the default retry policy
    pub fn new(backend: B, model: impl Into<String>, profile: PromptProfile) -> Self {
        Self { backend, model: model.into(), profile, retry: RetryPolicy::default() }
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The profile this translator was built with
    pub fn profile(&self) -> &PromptProfile {
        &self.profile
    }

    /// The backend this translator submits requests to
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Translate one snippet, retrying transient failures up to the policy
    /// ceiling. Never returns an error; failures are encoded in the result
    /// status so one bad row cannot abort a batch.
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        if request.source_snippet.trim().is_empty() {
            debug!("blank source snippet, skipping endpoint call");
            return TranslationResult::empty();
        }

        let payload = self.build_payload(request);

        let mut attempt = 1u32;
        let last_error = loop {
            match self.backend.complete(payload.clone()).await {
                Ok(content) => return self.extract(content),
                Err(ProviderError::ParseError(body)) => {
                    // The endpoint answered 200 with an unexpected schema.
                    // Not transient, so no retry, but the cascade may still
                    // salvage code that leaked outside the expected path.
                    warn!("completion response schema mismatch, attempting salvage");
                    if let Some(code) =
                        extract_translated_code(&body, ExtractionMode::Strict)
                    {
                        return TranslationResult::ok(code, body);
                    }
                    return TranslationResult::failed(
                        TranslationStatus::ParseFailed,
                        format!("Failed to parse response. Raw: {}...", truncate(&body, 50)),
                        body,
                    );
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_before_retry(attempt);
                    warn!(
                        "attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.retry.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => break e,
            }
        };

        TranslationResult::failed(
            TranslationStatus::NetworkFailed,
            format!("Network request failed: {}", last_error),
            String::new(),
        )
    }

    fn build_payload(&self, request: &TranslationRequest) -> ChatRequest {
        let messages = vec![
            ChatMessage::system(self.profile.system_prompt),
            ChatMessage::user(self.profile.user_message(&request.source_snippet)),
        ];
        ChatRequest::new(&self.model, messages)
            .temperature(request.temperature)
            .max_tokens(self.profile.max_tokens(&request.source_snippet, request.max_tokens))
    }

    fn extract(&self, content: String) -> TranslationResult {
        match extract_translated_code(&content, self.profile.extraction_mode) {
            Some(code) if !code.is_empty() => TranslationResult::ok(code, content),
            Some(_) | None => TranslationResult::failed(
                TranslationStatus::ParseFailed,
                format!("Extracted code was empty. Raw: {}...", truncate(&content, 50)),
                content,
            ),
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
