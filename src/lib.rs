/*!
 * # esotran - ESOPE/Fortran 77 to Fortran 2008 batch translator
 *
 * A Rust tool that batch-translates legacy Fortran 77 code with ESOPE
 * memory-management extensions into modern Fortran 2008 by calling a remote
 * LLM completion endpoint, one CSV row at a time.
 *
 * ## Features
 *
 * - Defensive extraction cascade recovering code from malformed, markdown-
 *   wrapped, or partially escaped JSON model responses
 * - Retry with exponential backoff on transport failures
 * - Prompt profiles selecting the response contract (JSON or plain code)
 * - Dynamic output-token budgeting proportional to input length
 * - Optional chrF scoring of translations against a reference column
 * - Semicolon/comma CSV auto-detection, unknown columns passed through
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management (defaults, env overrides)
 * - `extraction`: The response-extraction cascade
 * - `translation`: Request orchestration:
 *   - `translation::orchestrator`: Translator, retry policy, result types
 *   - `translation::prompts`: Prompt profiles
 * - `providers`: Completion endpoint client and backend trait
 * - `scoring`: chrF scoring client
 * - `batch`: CSV table I/O and the sequential row driver
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod batch;
pub mod errors;
pub mod extraction;
pub mod providers;
pub mod scoring;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use extraction::{ExtractionMode, extract_translated_code};
pub use translation::{
    PromptProfile, TranslationRequest, TranslationResult, TranslationStatus, Translator,
};
pub use errors::{AppError, ProviderError, TranslationError};
