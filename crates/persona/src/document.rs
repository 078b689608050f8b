//! The persona document: a JSON object describing who the assistant speaks as.
//!
//! No schema is enforced beyond a few recognized keys; anything the
//! extraction model invents becomes a new top-level field once merged.
//! Field order is insertion order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::merge::deep_merge;

pub const KEY_FULL_NAME: &str = "nomeCompleto";
pub const KEY_SHORT_DESCRIPTION: &str = "descricaoCurta";
pub const KEY_TONE: &str = "tomDeVoz";
pub const KEY_INTERESTS: &str = "interesses";
pub const KEY_DETAILS: &str = "detalhesAdicionais";

pub const DEFAULT_FULL_NAME: &str = "Assistente Padrão";
pub const DEFAULT_SHORT_DESCRIPTION: &str = "Um assistente virtual prestativo.";
pub const DEFAULT_TONE: &str = "Neutro";

/// Placeholder values that are never echoed into a prompt.
pub const DEFAULT_PLACEHOLDERS: [&str; 3] =
    [DEFAULT_FULL_NAME, DEFAULT_SHORT_DESCRIPTION, DEFAULT_TONE];

/// A persona profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Persona(Map<String, Value>);

impl Persona {
    /// Wrap an existing JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accept a decoded JSON value only if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deep-merge a suggested update into this persona.
    pub fn merge(&mut self, suggestion: Map<String, Value>) {
        deep_merge(&mut self.0, suggestion);
    }

    /// The sanitized view served to browsers.
    pub fn display_view(&self) -> Map<String, Value> {
        folio_security::sanitize_persona(&self.0)
    }
}

impl Default for Persona {
    fn default() -> Self {
        let mut fields = Map::new();
        fields.insert(KEY_FULL_NAME.into(), Value::String(DEFAULT_FULL_NAME.into()));
        fields.insert(
            KEY_SHORT_DESCRIPTION.into(),
            Value::String(DEFAULT_SHORT_DESCRIPTION.into()),
        );
        fields.insert(KEY_TONE.into(), Value::String(DEFAULT_TONE.into()));
        fields.insert(KEY_INTERESTS.into(), Value::Array(Vec::new()));
        fields.insert(KEY_DETAILS.into(), Value::Object(Map::new()));
        Self(fields)
    }
}
