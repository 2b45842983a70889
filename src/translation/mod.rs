/*!
 * AI-powered translation of legacy ESOPE/Fortran snippets.
 *
 * - `orchestrator`: request/result types, retry policy, Translator
 * - `prompts`: prompt profiles (system prompt, user template, token policy)
 */

pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{
    ERROR_MARKER, RetryPolicy, TranslationRequest, TranslationResult, TranslationStatus,
    Translator,
};
pub use prompts::PromptProfile;
