//! Provider Types
//!
//! Error taxonomy, request options, and response types shared by all
//! completion provider implementations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a completion provider can surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// API key missing or rejected
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Provider rate limit hit
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Seconds to wait before retrying, if the provider said
        retry_after: Option<u64>,
    },

    /// Request exceeded the configured timeout
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Provider-side failure (5xx)
    #[error("Server error: {message}")]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Malformed request (4xx other than auth/rate-limit)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Requested model does not exist
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// Anything else
    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for provider operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Per-call model parameters.
///
/// Carries the model identifier and sampling knobs the orchestrator derives
/// from a bot's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model identifier (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Optional output token cap
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    /// Create options for a model with a given temperature.
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens: None,
        }
    }

    /// Builder pattern: set a max token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// Token usage reported by a provider, when available.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Final assembled response from a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Full response text (concatenation of all streamed chunks)
    pub content: String,
    /// Token usage, if the provider reported it
    pub usage: Option<TokenUsage>,
    /// Provider stop reason, if any
    pub stop_reason: Option<String>,
}

impl CompletionResponse {
    /// Create a plain text response with no usage data.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            stop_reason: None,
        }
    }
}
