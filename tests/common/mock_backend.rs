/*!
 * Scripted completion backend for testing the orchestrator and the batch
 * driver without a live endpoint.
 */

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use esotran::errors::ProviderError;
use esotran::providers::CompletionBackend;
use esotran::providers::chat::ChatRequest;

/// One scripted answer from the fake endpoint
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Successful completion with this assistant message content
    Content(String),
    /// Transport failure with this error text
    Network(String),
    /// HTTP error with this status code
    Api(u16),
    /// 200 response whose body does not match the expected schema
    Schema(String),
}

/// Backend that answers from a fixed script, repeating the last entry once
/// the script runs out. Call count is tracked for retry assertions.
pub struct MockBackend {
    script: Mutex<Vec<ScriptedResponse>>,
    calls: AtomicU32,
}

impl MockBackend {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        assert!(!script.is_empty(), "mock backend needs at least one response");
        Self { script: Mutex::new(script), calls: AtomicU32::new(0) }
    }

    /// Backend that always answers with the same content
    pub fn always(content: impl Into<String>) -> Self {
        Self::new(vec![ScriptedResponse::Content(content.into())])
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, _request: ChatRequest) -> Result<String, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let script = self.script.lock().unwrap();
        let response = script.get(index).unwrap_or_else(|| script.last().unwrap());

        match response.clone() {
            ScriptedResponse::Content(content) => Ok(content),
            ScriptedResponse::Network(message) => Err(ProviderError::RequestFailed(message)),
            ScriptedResponse::Api(status_code) => Err(ProviderError::ApiError {
                status_code,
                message: "scripted error".to_string(),
            }),
            ScriptedResponse::Schema(body) => Err(ProviderError::ParseError(body)),
        }
    }
}
