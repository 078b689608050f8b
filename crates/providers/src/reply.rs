//! Post-processing of raw model text.
//!
//! Reasoning models wrap their scratch work in `<think>` (and sometimes echo
//! the prompt in `<user_query>`). Both spans are dropped before a reply is
//! shown or parsed. An unclosed tag is left alone.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Replies longer than this many chars are cut and marked with `...`.
pub const MAX_REPLY_LENGTH: usize = 2000;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>\s*").expect("think pattern is valid"));

static USER_QUERY_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<user_query>.*?</user_query>\s*").expect("user_query pattern is valid")
});

/// Remove every reasoning span, then trim.
pub fn strip_reasoning(text: &str) -> String {
    let mut out = text.to_string();
    for re in [&*THINK_SPAN, &*USER_QUERY_SPAN] {
        if re.is_match(&out) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out.trim().to_string()
}

/// Prepare a chat reply for display: strip reasoning and bound the length.
pub fn clean_reply(text: &str) -> String {
    let stripped = strip_reasoning(text);
    match stripped.char_indices().nth(MAX_REPLY_LENGTH) {
        Some((cut, _)) => format!("{}...", &stripped[..cut]),
        None => stripped,
    }
}
