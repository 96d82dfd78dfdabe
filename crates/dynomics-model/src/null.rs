//! Missing-value tokens.

use serde::{Deserialize, Serialize};

use crate::value::RawValue;

/// Tokens used when a column does not override its null policy.
pub const DEFAULT_NULL_TOKENS: [&str; 4] = [
    "not_applicable",
    "not_collected",
    "not_provided",
    "restricted_access",
];

/// The set of raw tokens a column treats as "missing".
///
/// Token order is preserved so dictionaries round-trip unchanged; duplicates
/// are dropped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct NullPolicy {
    tokens: Vec<String>,
}

impl NullPolicy {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.into();
            if !unique.contains(&token) {
                unique.push(token);
            }
        }
        Self { tokens: unique }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Returns true for absent cells and for text equal to one of the tokens.
    pub fn is_null(&self, value: &RawValue) -> bool {
        match value {
            RawValue::Missing => true,
            RawValue::Text(text) => self.contains(text),
            _ => false,
        }
    }

    pub fn is_default(&self) -> bool {
        self.tokens.iter().map(String::as_str).eq(DEFAULT_NULL_TOKENS)
    }
}

impl Default for NullPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_TOKENS)
    }
}

impl From<Vec<String>> for NullPolicy {
    fn from(tokens: Vec<String>) -> Self {
        Self::new(tokens)
    }
}

impl From<NullPolicy> for Vec<String> {
    fn from(policy: NullPolicy) -> Self {
        policy.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tokens_are_null() {
        let policy = NullPolicy::default();
        assert!(policy.is_default());
        assert!(policy.is_null(&RawValue::text("not_collected")));
        assert!(policy.is_null(&RawValue::Missing));
        assert!(!policy.is_null(&RawValue::text("Not_Collected")));
        assert!(!policy.is_null(&RawValue::Int(0)));
    }

    #[test]
    fn custom_tokens_keep_order_and_drop_duplicates() {
        let policy = NullPolicy::new(["NA", "unknown", "NA"]);
        assert_eq!(policy.tokens(), ["NA".to_string(), "unknown".to_string()]);
        assert!(!policy.is_default());
        assert!(!policy.is_null(&RawValue::text("not_applicable")));
    }
}
