//! Error types for the Folio domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; callers map them to their
//! own surfaces (HTTP responses, CLI exit codes).

use thiserror::Error;

/// Failures of the external completion API.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The upstream answered with a non-success status.
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// The upstream answered 2xx but the body was unusable.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Request payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether the upstream status (if any) was a server-side failure.
    pub fn is_upstream_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status_code, .. } if *status_code >= 500)
    }
}

/// Failures of the persona store and of AI-suggested persona updates.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Storage error: {0}")]
    Storage(String),

    /// The model output could not be turned into a persona update.
    /// `raw` keeps the model text for debugging.
    #[error("Invalid persona suggestion: {reason}")]
    InvalidSuggestion { reason: String, raw: String },
}
