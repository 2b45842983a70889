/*!
 * Error types for the esotran application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the completion or scoring endpoints
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails (connection, timeout)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Response arrived with a 200 status but its schema could not be parsed.
    /// The payload is the full raw body so callers can attempt salvage.
    #[error("Failed to parse API response")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ProviderError {
    /// Whether the orchestrator should spend a retry attempt on this error.
    ///
    /// Transport problems and server-side errors are transient; a malformed
    /// 200 body or a client-side rejection would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) => false,
        }
    }
}

/// Errors that can occur during translation of a single row
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// No extraction strategy recovered usable content from the response
    #[error("Extraction failed: {0}")]
    Extraction(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error reading or writing the CSV table
    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
