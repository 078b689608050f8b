//! # Folio Core
//!
//! Domain types, traits, and error definitions for the Folio persona chat
//! backend. This crate has **no framework dependencies**: it defines the
//! domain model that the other crates implement against.
//!
//! The completion backend is a trait here; the HTTP implementation lives in
//! `folio-providers`, so handlers can be exercised against scripted providers.

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{PersonaError, ProviderError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
