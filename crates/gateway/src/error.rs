//! HTTP error responses.
//!
//! Every failure a handler can hit is converted into an [`ApiError`], which
//! renders as `{"error": ..., "details"?: ...}`. In production mode internal
//! detail strings are withheld, except for the raw model text attached to a
//! failed persona extraction.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_config::CredentialError;
use folio_core::error::{PersonaError, ProviderError};
use folio_security::ValidationError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach `details` only outside production.
    fn with_debug_details(self, production: bool, details: impl Into<String>) -> Self {
        if production { self } else { self.with_details(details) }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.error
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn from_validation(err: &ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }

    pub fn from_rejection(rejection: &JsonRejection, production: bool) -> Self {
        let error = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Content-Type must be application/json.",
            _ => "Invalid or missing request body.",
        };
        Self::new(StatusCode::BAD_REQUEST, error).with_debug_details(production, rejection.body_text())
    }

    pub fn from_credentials(err: &CredentialError, production: bool) -> Self {
        let error = match err {
            CredentialError::Missing => "Server configuration incomplete.",
            CredentialError::Malformed(_) => "Server configuration invalid.",
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_debug_details(production, err.to_string())
    }

    pub fn from_provider(err: &ProviderError, production: bool) -> Self {
        match err {
            ProviderError::Timeout(_) => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, "Response time exceeded. Please try again.")
            }
            ProviderError::Network(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable. Please try again.",
            ),
            ProviderError::ApiError {
                status_code,
                message,
            } => {
                let status = if err.is_upstream_server_error() {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::BAD_REQUEST
                };
                if production {
                    Self::new(status, "Error processing the request. Please try again.")
                } else {
                    Self::new(status, format!("API error: {status_code} - {message}"))
                }
            }
            ProviderError::InvalidResponse(reason) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Invalid response from the model API.")
                    .with_debug_details(production, reason.clone())
            }
            ProviderError::PayloadTooLarge { .. } => Self::new(StatusCode::BAD_REQUEST, "Payload too large."),
            ProviderError::NotConfigured(reason) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration incomplete.")
                    .with_debug_details(production, reason.clone())
            }
        }
    }

    pub fn from_persona(err: &PersonaError, production: bool) -> Self {
        match err {
            PersonaError::Storage(reason) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to access persona data.")
                    .with_debug_details(production, reason.clone())
            }
            PersonaError::InvalidSuggestion { raw, .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The AI did not return a valid persona update.",
            )
            .with_details(raw.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.error,
            details: self.details.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}
