//! System prompt rendering.
//!
//! The persona is rendered as a bulleted list in field order. Every key and
//! value passes through the sanitizer and its size caps, default placeholder
//! strings are skipped, and the whole body is bounded before the closing
//! instruction is appended.

use folio_security::sanitize::{
    MAX_ARRAY_ITEM_LENGTH, MAX_ARRAY_ITEMS, MAX_ARRAY_ITEMS_BEFORE_FILTER, MAX_FIELD_LENGTH,
    MAX_OBJECT_KEYS, MAX_OBJECT_VALUE_LENGTH, sanitize_input, sanitize_key, truncate_chars,
};
use serde_json::{Map, Value};

use crate::document::{DEFAULT_PLACEHOLDERS, Persona};

/// Budget for the preamble plus rendered persona, in chars.
pub const MAX_SYSTEM_PROMPT_LENGTH: usize = 5000;

const PREAMBLE: &str = "Você deve responder como se fosse eu, em primeira pessoa. \
Adote a seguinte persona e use todas as informações fornecidas sobre mim para responder \
à mensagem do usuário de forma natural e consistente. Se uma informação não estiver \
disponível, não a invente. Responda apenas com base nos fatos apresentados sobre a minha \
persona.\n\nMinha Persona:\n";

const CLOSING: &str = "\nCom base estrita nesta persona, responda à seguinte mensagem do usuário:";

/// Render the chat system prompt for `persona`.
pub fn build_system_prompt(persona: &Persona) -> String {
    let mut body = String::from(PREAMBLE);

    for (key, value) in persona.fields() {
        let clean_key = sanitize_key(key);
        if clean_key.is_empty() {
            continue;
        }
        let label = humanize_key(&clean_key);

        match value {
            Value::Array(items) => render_array(&mut body, &label, items),
            Value::Object(entries) => render_object(&mut body, &label, entries),
            Value::String(s) => {
                if s.trim().is_empty() || DEFAULT_PLACEHOLDERS.contains(&s.as_str()) {
                    continue;
                }
                let clean = sanitize_input(s, MAX_FIELD_LENGTH);
                if !clean.is_empty() {
                    body.push_str(&format!(" - {label}: {clean}.\n"));
                }
            }
            Value::Number(n) => body.push_str(&format!(" - {label}: {n}.\n")),
            Value::Bool(b) => body.push_str(&format!(" - {label}: {b}.\n")),
            Value::Null => {}
        }
    }

    if body.chars().count() > MAX_SYSTEM_PROMPT_LENGTH {
        body = format!("{}...", truncate_chars(&body, MAX_SYSTEM_PROMPT_LENGTH));
    }

    body.push_str(CLOSING);
    body
}

fn render_array(body: &mut String, label: &str, items: &[Value]) {
    if items.is_empty() || items.len() > MAX_ARRAY_ITEMS_BEFORE_FILTER {
        return;
    }

    let kept: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| sanitize_input(s, MAX_ARRAY_ITEM_LENGTH))
        .filter(|s| !s.is_empty())
        .take(MAX_ARRAY_ITEMS)
        .collect();

    if !kept.is_empty() {
        body.push_str(&format!(" - {label}: {}.\n", kept.join(", ")));
    }
}

fn render_object(body: &mut String, label: &str, entries: &Map<String, Value>) {
    if entries.is_empty() || entries.len() > MAX_OBJECT_KEYS {
        return;
    }

    body.push_str(&format!(" - {label}:\n"));
    let mut emitted = 0;
    for (sub_key, sub_value) in entries {
        if emitted >= MAX_OBJECT_KEYS {
            break;
        }
        let Some(rendered) = render_nested_value(sub_value) else {
            continue;
        };
        let clean_sub_key = sanitize_key(sub_key);
        if clean_sub_key.is_empty() {
            continue;
        }
        body.push_str(&format!("   - {}: {rendered}\n", humanize_key(&clean_sub_key)));
        emitted += 1;
    }
}

/// One-line rendering of a nested value; `None` when nothing is left to say.
fn render_nested_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => sanitize_input(s, MAX_OBJECT_VALUE_LENGTH),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(sanitize_input(s, MAX_ARRAY_ITEM_LENGTH)),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Null | Value::Array(_) | Value::Object(_) => None,
                })
                .filter(|s| !s.is_empty())
                .take(MAX_ARRAY_ITEMS)
                .collect();
            sanitize_input(&parts.join(", "), MAX_OBJECT_VALUE_LENGTH)
        }
        Value::Object(_) => sanitize_input(&value.to_string(), MAX_OBJECT_VALUE_LENGTH),
        Value::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// `nomeCompleto` → `Nome Completo`, `cidade_natal` → `Cidade natal`.
pub fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            spaced.push(' ');
            spaced.push(c);
        } else if c == '_' {
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    let trimmed = spaced.trim_start();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
