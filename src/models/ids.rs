//! Identifiers for stored rules, overrides and decisions
//!
//! Each is a random UUID shown to the user in a short `prefix-xxxxxxxx`
//! form. Commands accept either that short form or the full UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! short_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Whether `query` names this id, ignoring case and surrounding space
            pub fn matches(&self, query: &str) -> bool {
                matches_uuid(&self.0, Self::PREFIX, query)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let simple = self.0.simple().to_string();
                write!(f, "{}{}", Self::PREFIX, &simple[..SHORT_LEN])
            }
        }
    };
}

const SHORT_LEN: usize = 8;

/// Accepts `pre-1a2b3c4d`, the full hyphenated UUID, or the full UUID behind the prefix
fn matches_uuid(uuid: &Uuid, prefix: &str, query: &str) -> bool {
    let query = query.trim().to_ascii_lowercase();
    let body = query.strip_prefix(prefix).unwrap_or(&query);

    if body.len() == SHORT_LEN && query.len() > body.len() {
        return uuid.simple().to_string().starts_with(body);
    }
    Uuid::parse_str(body).is_ok_and(|parsed| parsed == *uuid)
}

short_id!(
    /// Stable identity of an envelope rule across renames
    RuleId,
    "rul-"
);
short_id!(
    /// Identity of a routing override, quoted by `override remove`
    OverrideId,
    "ovr-"
);
short_id!(
    /// Token the user quotes to apply a stored decision
    DecisionToken,
    "dec-"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_display() {
        let token = DecisionToken::new();
        let shown = token.to_string();
        assert!(shown.starts_with("dec-"));
        assert_eq!(shown.len(), 12);
        assert!(shown[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_matches_short_and_full_forms() {
        let id = OverrideId::new();
        let short = id.to_string();
        let full = id.0.to_string();

        assert!(id.matches(&short));
        assert!(id.matches(&format!("  {}  ", short.to_uppercase())));
        assert!(id.matches(&full));
        assert!(id.matches(&format!("ovr-{}", full)));
        assert!(!id.matches(&short[4..]));
        assert!(!id.matches("ovr-00000000"));
        assert!(!id.matches(""));
    }

    #[test]
    fn test_prefix_belongs_to_kind() {
        let rule = RuleId::new();
        let borrowed = format!("dec-{}", &rule.to_string()[4..]);
        assert!(!rule.matches(&borrowed));
    }

    #[test]
    fn test_serializes_as_plain_uuid() {
        let token = DecisionToken::new();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", token.0));
        let back: DecisionToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
