//! Generative model provider abstractions and implementations.
//!
//! Handlers only see [`TextProvider`]; the concrete backend (Gemini or the
//! in-process mock) is chosen once at startup.

pub mod gemini;
pub mod mock;

use crate::models::Prompt;
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
///
/// Variants carrying a message display it verbatim, so the upstream's own
/// description reaches the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("{0}")]
    ApiError(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Timeout(String),

    #[error("Content was blocked by the model's safety filters")]
    ContentFiltered,

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("{0}")]
    NetworkError(String),
}

/// Stable failure categories exposed to clients as `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Timeout,
    Quota,
    InvalidInput,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Quota => "quota",
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl ProviderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::Timeout(_) => ErrorCategory::Timeout,
            ProviderError::RateLimited(_) => ErrorCategory::Quota,
            ProviderError::InvalidRequest(_) | ProviderError::ContentFiltered => {
                ErrorCategory::InvalidInput
            }
            ProviderError::NotConfigured(_)
            | ProviderError::ApiError(_)
            | ProviderError::EmptyResponse
            | ProviderError::NetworkError(_) => ErrorCategory::Unknown,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Upstream {
            code: err.category().as_str(),
            message: err.to_string(),
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    Other,
}

impl FinishReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::Other => "other",
        }
    }
}

/// Result of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// Generated text relayed to the caller.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// A remote (or mocked) model that turns a prompt into text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short identifier used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Model id used in logs and metric labels.
    fn model(&self) -> &str;

    /// Generate a single, complete text response.
    async fn generate(&self, prompt: &Prompt) -> Result<ProviderResponse, ProviderError>;

    /// Check that the provider is usable.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_quota_timeout_and_input() {
        assert_eq!(
            ProviderError::RateLimited("quota".into()).category(),
            ErrorCategory::Quota
        );
        assert_eq!(
            ProviderError::Timeout("deadline".into()).category(),
            ErrorCategory::Timeout
        );
        assert_eq!(
            ProviderError::ContentFiltered.category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            ProviderError::NetworkError("reset".into()).category(),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn upstream_message_is_relayed_verbatim() {
        let err: AppError =
            ProviderError::InvalidRequest("Unsupported MIME type: text/x-foo".into()).into();

        match err {
            AppError::Upstream { code, message } => {
                assert_eq!(code, "invalid_input");
                assert_eq!(message, "Unsupported MIME type: text/x-foo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
