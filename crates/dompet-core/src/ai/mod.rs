//! Completion backend abstraction
//!
//! The pipeline only needs one thing from a language model: turn a prompt into
//! text. [`CompletionBackend`] is that seam.
//!
//! - `OllamaBackend`: HTTP client for Ollama's `/api/generate`
//! - `MockBackend`: canned replies/failures for tests and offline runs
//!
//! Failures come back as [`CompletionError`] so callers can tell a slow model
//! (timeout) from an unreachable one or a garbled reply.

mod mock;
mod ollama;
pub mod parsing;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use parsing::{extract_fields, ExtractError, Fields};

use async_trait::async_trait;
use thiserror::Error;

/// Why a completion call produced no text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// The call exceeded its timeout
    #[error("Completion request timed out")]
    Timeout,

    /// The service could not be reached or the connection broke
    #[error("Completion service unreachable: {0}")]
    Connection(String),

    /// The service answered with a non-success status
    #[error("Completion service returned HTTP {0}")]
    Status(u16),

    /// Success status, but no usable text in the body
    #[error("Malformed completion response: {0}")]
    Malformed(String),

    /// Anything else (request construction, etc.)
    #[error("Completion request failed: {0}")]
    Internal(String),
}

impl CompletionError {
    /// Classify a reqwest failure
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else if e.is_builder() {
            Self::Internal(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

/// A text-completion service
///
/// Backends must be Send + Sync; one instance is shared by every request.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a prompt and return the raw completion text
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Endpoint URL (for logging)
    fn host(&self) -> &str;
}
