//! Persona management for Folio.
//!
//! - `document`: the persona type and its default values
//! - `merge`: deep-merge of AI-suggested updates
//! - `store`: the file-backed, single-writer persona store
//! - `prompt`: rendering the persona into a chat system prompt
//! - `extract`: the extraction prompt and suggestion parsing

pub mod document;
pub mod extract;
pub mod merge;
pub mod prompt;
pub mod store;

pub use document::Persona;
pub use extract::{build_extraction_prompt, parse_suggestion};
pub use merge::deep_merge;
pub use prompt::build_system_prompt;
pub use store::PersonaStore;
