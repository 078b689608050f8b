//! Route handlers.
//!
//! Each request makes at most one completion call and never retries.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use folio_core::message::Message;
use folio_core::provider::ProviderRequest;
use folio_persona::{build_extraction_prompt, build_system_prompt, parse_suggestion};
use folio_providers::{clean_reply, strip_reasoning};
use folio_security::{ValidationError, escape_html, validate_message};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct PersonaUpdateRequest {
    #[serde(default)]
    pub text: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersonaUpdateResponse {
    pub success: bool,
    pub message: String,
    pub persona: Map<String, Value>,
}

/// A body field must be a non-empty JSON string before it is validated.
fn required_text(field: Option<&Value>) -> Result<&str, ValidationError> {
    match field {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(ValidationError::Missing),
    }
}

/// Validate a free-text body field.
fn validated(field: Option<&Value>) -> Result<String, ApiError> {
    required_text(field)
        .and_then(validate_message)
        .map_err(|e| ApiError::from_validation(&e))
}

/// `POST /chat`: answer a visitor message in the persona's voice.
pub async fn chat(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let production = state.is_production();

    let Json(payload) = payload.map_err(|r| {
        warn!(%request_id, rejection = %r.body_text(), "Chat body rejected");
        ApiError::from_rejection(&r, production)
    })?;
    let message = validated(payload.message.as_ref()).inspect_err(|e| {
        debug!(%request_id, error = e.message(), "Chat message rejected");
    })?;
    state.check_credentials().inspect_err(|_| {
        error!(%request_id, "Chat refused: completion API credentials unusable");
    })?;

    info!(%request_id, chars = message.chars().count(), "Chat request received");

    let persona = state.store.read().await.map_err(|e| {
        error!(%request_id, error = %e, "Failed to load persona");
        ApiError::from_persona(&e, production)
    })?;

    let provider_config = &state.config.provider;
    let request = ProviderRequest::new(
        provider_config.model.clone(),
        vec![
            Message::system(build_system_prompt(&persona)),
            Message::user(message),
        ],
    )
    .with_temperature(provider_config.chat_temperature)
    .with_max_tokens(provider_config.chat_max_tokens);

    let response = state.provider.complete(request).await.map_err(|e| {
        error!(%request_id, provider = %state.provider.name(), error = %e, "Chat completion failed");
        ApiError::from_provider(&e, production)
    })?;

    let reply = escape_html(&clean_reply(&response.message.content));
    info!(%request_id, chars = reply.chars().count(), "Chat reply sent");
    Ok(Json(ChatResponse { reply }))
}

/// `POST /persona-chat-update`: extract persona facts from free text and
/// merge them into the stored persona.
pub async fn persona_chat_update(
    State(state): State<SharedState>,
    payload: Result<Json<PersonaUpdateRequest>, JsonRejection>,
) -> Result<Json<PersonaUpdateResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let production = state.is_production();

    let Json(payload) = payload.map_err(|r| {
        warn!(%request_id, rejection = %r.body_text(), "Persona update body rejected");
        ApiError::from_rejection(&r, production)
    })?;
    let text = validated(payload.text.as_ref())?;
    state.check_credentials().inspect_err(|_| {
        error!(%request_id, "Persona update refused: completion API credentials unusable");
    })?;

    info!(
        %request_id,
        preview = %text.chars().take(100).collect::<String>(),
        "Extracting persona update"
    );

    let provider_config = &state.config.provider;
    let request = ProviderRequest::new(
        provider_config.model.clone(),
        vec![Message::system(build_extraction_prompt(&text))],
    )
    .with_temperature(provider_config.extract_temperature)
    .with_max_tokens(provider_config.extract_max_tokens);

    let response = state.provider.complete(request).await.map_err(|e| {
        error!(%request_id, provider = %state.provider.name(), error = %e, "Extraction completion failed");
        ApiError::from_provider(&e, production)
    })?;

    let raw = response.message.content;
    let suggestion = parse_suggestion(&strip_reasoning(&raw), &raw).map_err(|e| {
        warn!(%request_id, error = %e, "Model returned an unusable persona update");
        ApiError::from_persona(&e, production)
    })?;
    debug!(%request_id, keys = suggestion.len(), "Persona suggestion parsed");

    let persona = state.store.apply_update(suggestion).await.map_err(|e| {
        error!(%request_id, error = %e, "Failed to save persona");
        ApiError::from_persona(&e, production)
    })?;

    Ok(Json(PersonaUpdateResponse {
        success: true,
        message: "Persona updated successfully.".into(),
        persona: persona.display_view(),
    }))
}

/// `GET /get-persona`: the sanitized persona document.
pub async fn get_persona(State(state): State<SharedState>) -> Result<Json<Map<String, Value>>, ApiError> {
    let persona = state.store.read().await.map_err(|e| {
        error!(error = %e, "Failed to load persona");
        ApiError::from_persona(&e, state.is_production())
    })?;
    Ok(Json(persona.display_view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_text_accepts_only_non_empty_strings() {
        assert_eq!(required_text(Some(&json!("Oi"))), Ok("Oi"));
        assert_eq!(required_text(Some(&json!(""))), Err(ValidationError::Missing));
        assert_eq!(required_text(Some(&json!(42))), Err(ValidationError::Missing));
        assert_eq!(required_text(None), Err(ValidationError::Missing));
    }

    #[test]
    fn whitespace_only_is_empty_after_sanitization() {
        let err = validated(Some(&json!(" \u{0}\t "))).unwrap_err();
        assert_eq!(err.message(), "Message cannot be empty after sanitization.");
    }
}
