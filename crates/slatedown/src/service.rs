//! MarkdownService - one object holding both directions' configuration.

use slatedown_core::{serialize_with_rules, Document, Options, Rule, Rules};

use crate::options::ParseOptions;
use crate::parser;
use crate::Result;

/// Parses Markdown into documents and serializes them back
pub struct MarkdownService {
    options: Options,
    parse_options: ParseOptions,
    rules: Rules,
}

impl MarkdownService {
    /// Create a service with default options and the built-in rules
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            parse_options: ParseOptions::default(),
            rules: Rules::new(),
        }
    }

    /// Create a service with custom serializer and parser options
    pub fn with_options(options: Options, parse_options: ParseOptions) -> Self {
        Self {
            options,
            parse_options,
            rules: Rules::new(),
        }
    }

    /// Markdown to document; falls back to an empty paragraph on failure
    pub fn parse(&self, text: &str) -> Document {
        parser::parse(text, &self.parse_options)
    }

    /// Markdown to document, surfacing tokenizer and build errors
    pub fn try_parse(&self, text: &str) -> Result<Document> {
        parser::try_parse(text, &self.parse_options)
    }

    /// Alias of [`MarkdownService::parse`] for editor integrations
    pub fn deserialize(&self, text: &str) -> Document {
        self.parse(text)
    }

    /// Document to Markdown
    pub fn serialize(&self, document: &Document) -> String {
        serialize_with_rules(document, &self.rules, &self.options)
    }

    /// Register a rendering rule that takes precedence over the built-in ones
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    pub fn remove_rule(&mut self, key: &str) -> Option<Rule> {
        self.rules.remove(key)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    pub fn parse_options_mut(&mut self) -> &mut ParseOptions {
        &mut self.parse_options
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slatedown_core::{BlockType, InlineNode, Node, Subject};

    #[test]
    fn test_round_trip() {
        let service = MarkdownService::new();
        let doc = service.parse("## Notes\n\n- one\n- two");
        assert_eq!(service.serialize(&doc), "## Notes\n\n- one\n- two");
    }

    #[test]
    fn test_custom_rule_wins() {
        let mut service = MarkdownService::new();
        service.add_rule(
            "setext",
            Rule::for_block(BlockType::Heading1, |_, content, _| {
                Some(format!("{content}\n{}\n", "=".repeat(content.len())))
            }),
        );
        let doc = service.parse("# Title");
        assert_eq!(service.serialize(&doc), "Title\n=====");

        assert!(service.remove_rule("setext").is_some());
        assert_eq!(service.serialize(&doc), "# Title");
    }

    #[test]
    fn test_options_are_used() {
        let mut service = MarkdownService::new();
        service.options_mut().hr = "***".to_string();
        let mut doc = service.parse("a");
        doc.nodes.push(slatedown_core::BlockNode::new(BlockType::HorizontalRule));
        assert_eq!(service.serialize(&doc), "a\n\n***");
    }

    #[test]
    fn test_placeholders_from_parse_options() {
        let mut service = MarkdownService::new();
        service
            .parse_options_mut()
            .placeholders
            .push(crate::PlaceholderRule::new(r"\$\w+", "variable"));
        let doc = service.deserialize("Hi $name");
        let found = doc.nodes[0].nodes.iter().any(|node| {
            matches!(
                node,
                Node::Inline(InlineNode::AutocompletePlaceholder { id, .. }) if id == "variable"
            )
        });
        assert!(found);
        assert_eq!(service.serialize(&doc), "Hi $name");
    }

    #[test]
    fn test_text_rule_override() {
        let mut service = MarkdownService::new();
        service.add_rule(
            "shout",
            Rule::new(
                slatedown_core::Filter::predicate(|subject, _| matches!(subject, Subject::Text(_))),
                |_, content, _| Some(content.to_uppercase()),
            ),
        );
        let doc = service.parse("quiet words");
        assert_eq!(service.serialize(&doc), "QUIET WORDS");
    }
}
