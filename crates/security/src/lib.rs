//! Security module for Folio: input/output sanitization and origin policy.
//!
//! Provides:
//! - **Sanitization**: control-character stripping, length caps, HTML
//!   escaping, key cleaning, and the persona display view
//! - **Origin policy**: CORS allowlisting of browser origins

pub mod origin;
pub mod sanitize;

pub use origin::OriginPolicy;
pub use sanitize::{
    ValidationError, escape_html, sanitize_input, sanitize_key, sanitize_persona, strip_control,
    validate_message, validate_text,
};
