//! Text sanitization: control-character stripping, length caps, HTML
//! escaping, and the display view of the persona document.
//!
//! All lengths are counted in `char`s, never bytes, so truncation can not
//! split a code point.

use serde_json::{Map, Value};

/// Maximum accepted length of a visitor message (after sanitization).
pub const MAX_MESSAGE_LENGTH: usize = 2000;
/// Cap for top-level string fields of the persona.
pub const MAX_FIELD_LENGTH: usize = 1000;
/// Cap for each string item of a persona array.
pub const MAX_ARRAY_ITEM_LENGTH: usize = 200;
/// Arrays keep at most this many items after filtering.
pub const MAX_ARRAY_ITEMS: usize = 50;
/// Arrays longer than this are ignored when building prompts.
pub const MAX_ARRAY_ITEMS_BEFORE_FILTER: usize = 100;
/// Nested objects keep at most this many entries.
pub const MAX_OBJECT_KEYS: usize = 50;
/// Cap for each value of a nested persona object.
pub const MAX_OBJECT_VALUE_LENGTH: usize = 500;

/// Why a visitor message was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid or empty message.")]
    Missing,

    #[error("Message cannot be empty after sanitization.")]
    Empty,

    #[error("Message too long. Maximum of {max} characters.")]
    TooLong { max: usize },
}

/// ASCII control characters: U+0000–U+001F and U+007F.
pub fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}')
}

/// Remove every ASCII control character.
pub fn strip_control(text: &str) -> String {
    text.chars().filter(|c| !is_control(*c)).collect()
}

/// Borrow at most `cap` chars of `text`.
pub fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Strip control characters, trim, and cap at `cap` chars.
///
/// Sanitizing an already-sanitized string returns it unchanged.
pub fn sanitize_input(text: &str, cap: usize) -> String {
    let stripped = strip_control(text);
    truncate_chars(stripped.trim(), cap).trim_end().to_string()
}

/// Validate a visitor message, returning the sanitized text.
///
/// Unlike [`sanitize_input`] this never truncates: over-long input is
/// rejected so the visitor knows their message was not sent in full.
pub fn validate_message(raw: &str) -> Result<String, ValidationError> {
    validate_text(raw, MAX_MESSAGE_LENGTH)
}

/// [`validate_message`] with an explicit limit.
pub fn validate_text(raw: &str, max: usize) -> Result<String, ValidationError> {
    let cleaned = strip_control(raw).trim().to_string();
    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }
    if cleaned.chars().count() > max {
        return Err(ValidationError::TooLong { max });
    }
    Ok(cleaned)
}

/// Escape HTML metacharacters before text reaches a browser.
///
/// `&` is left alone, which keeps the function idempotent.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Keep only `[A-Za-z0-9_]`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn clip(text: &str, cap: usize) -> String {
    truncate_chars(&strip_control(text), cap).to_string()
}

/// Build the display view of a persona document.
///
/// Keys are reduced to `[A-Za-z0-9_]`; strings, array items and nested
/// values are control-stripped and capped; non-string array items and
/// nested entries are dropped; nulls are dropped.
pub fn sanitize_persona(persona: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in persona {
        let clean_key = sanitize_key(key);
        if clean_key.is_empty() {
            continue;
        }

        match value {
            Value::String(s) => {
                out.insert(clean_key, Value::String(clip(s, MAX_FIELD_LENGTH)));
            }
            Value::Array(items) => {
                let kept: Vec<Value> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| Value::String(clip(s, MAX_ARRAY_ITEM_LENGTH)))
                    .take(MAX_ARRAY_ITEMS)
                    .collect();
                out.insert(clean_key, Value::Array(kept));
            }
            Value::Object(entries) => {
                let mut nested = Map::new();
                for (sub_key, sub_value) in entries {
                    if nested.len() >= MAX_OBJECT_KEYS {
                        break;
                    }
                    let Value::String(s) = sub_value else {
                        continue;
                    };
                    let clean_sub_key = sanitize_key(sub_key);
                    if clean_sub_key.is_empty() {
                        continue;
                    }
                    nested.insert(clean_sub_key, Value::String(clip(s, MAX_OBJECT_VALUE_LENGTH)));
                }
                if !nested.is_empty() {
                    out.insert(clean_key, Value::Object(nested));
                }
            }
            Value::Number(_) | Value::Bool(_) => {
                out.insert(clean_key, value.clone());
            }
            Value::Null => {}
        }
    }

    out
}
