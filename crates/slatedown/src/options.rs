//! Parse configuration

use serde::{Deserialize, Serialize};

/// Recognizes a host-defined inline reference such as `$term`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRule {
    /// Regular expression matched against plain text
    #[serde(alias = "regex")]
    pub pattern: String,

    /// Carried onto every placeholder node this rule produces
    #[serde(alias = "id")]
    pub identifier: String,
}

impl PlaceholderRule {
    pub fn new(pattern: &str, identifier: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

/// Options for Markdown parsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Placeholder rules, tried in order
    #[serde(default)]
    pub placeholders: Vec<PlaceholderRule>,
}

impl ParseOptions {
    pub fn with_placeholder(mut self, pattern: &str, identifier: &str) -> Self {
        self.placeholders.push(PlaceholderRule::new(pattern, identifier));
        self
    }
}
