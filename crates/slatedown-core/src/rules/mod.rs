//! Rule system for document to Markdown rendering.

mod markdown;
mod rule;

pub use markdown::markdown_rules;
pub use rule::{Filter, Kind, ReplacementFn, Rule, Subject};

use indexmap::IndexMap;

use crate::serialize::RenderContext;

/// Collection of rules for rendering
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Built-in rules: block, inline, mark, then text
    markdown_rules: Vec<Rule>,
}

impl Rules {
    /// Create a new Rules instance with the built-in rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            markdown_rules: markdown_rules(),
        }
    }

    /// Add a custom rule; a rule with the same key is replaced in place
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Remove a custom rule by key
    pub fn remove(&mut self, key: &str) -> Option<Rule> {
        self.custom_rules.shift_remove(key)
    }

    /// Render a subject with the first rule that matches and accepts it
    pub fn apply(
        &self,
        subject: &Subject<'_>,
        content: &str,
        ctx: &mut RenderContext<'_>,
    ) -> Option<String> {
        for rule in self.custom_rules.values().chain(self.markdown_rules.iter()) {
            if !rule.filter.matches(subject, ctx) {
                continue;
            }
            if let Some(out) = rule.replace(subject, content, ctx) {
                return Some(out);
            }
        }
        None
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
