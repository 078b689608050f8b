//! Origin allowlist: which browser origins may call the gateway.
//!
//! Rules:
//! - A list containing `"*"` allows every origin
//! - Otherwise the request origin must match an entry exactly
//!   (a trailing `/` on a configured entry is ignored)

/// Unified origin policy enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Any origin is accepted (and mirrored back).
    Any,
    /// Only these origins are accepted.
    List(Vec<String>),
}

impl OriginPolicy {
    /// Build a policy from configured origins.
    pub fn from_origins(origins: &[String]) -> Self {
        if origins.iter().any(|o| o.trim() == "*") {
            return OriginPolicy::Any;
        }

        let list = origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        OriginPolicy::List(list)
    }

    /// Check if a request origin is allowed.
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::Any => true,
            OriginPolicy::List(list) => list.iter().any(|o| o == origin),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, OriginPolicy::Any)
    }
}
