//! Completion providers for Folio.
//!
//! All providers implement the `folio_core::Provider` trait. The gateway
//! talks to an `OpenAiCompatProvider` wrapped in a `DeadlineProvider`, and
//! cleans the returned text with the `reply` helpers.

pub mod deadline;
pub mod openai_compat;
pub mod reply;

pub use deadline::DeadlineProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use reply::{clean_reply, strip_reasoning};
