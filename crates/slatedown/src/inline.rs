//! Inline token streams to text runs and inline nodes.

use indexmap::IndexSet;

use slatedown_core::{InlineNode, Mark, MarkType, Node, TextBlock, TextNode};

use crate::token::{Token, TokenKind};

/// The node currently being filled
enum Pending {
    None,
    Text(TextNode),
    Link {
        label: String,
        href: String,
        title: Option<String>,
    },
    Abbr {
        label: String,
        title: String,
    },
}

struct InlineBuilder {
    nodes: Vec<Node>,
    pending: Pending,
    /// Markups of the marks open at the current position, outermost first
    marks: IndexSet<String>,
}

impl InlineBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            pending: Pending::None,
            marks: IndexSet::new(),
        }
    }

    fn flush(&mut self) {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::None => {}
            Pending::Text(text) => {
                if !text.ranges.is_empty() {
                    self.nodes.push(Node::Text(text));
                }
            }
            Pending::Link { label, href, title } => {
                self.nodes.push(Node::Inline(InlineNode::Link {
                    text: TextNode::from_text(&label),
                    href,
                    title,
                }));
            }
            Pending::Abbr { label, title } => {
                self.nodes.push(Node::Inline(InlineNode::Abbr {
                    text: TextNode::from_text(&label),
                    title,
                }));
            }
        }
    }

    /// Emit a self-contained inline node between two flushes
    fn standalone(&mut self, node: InlineNode) {
        self.flush();
        self.nodes.push(Node::Inline(node));
    }

    fn push_range(&mut self, range: TextBlock) {
        match &mut self.pending {
            Pending::Text(text) => text.push(range),
            Pending::Link { label, .. } | Pending::Abbr { label, .. } => {
                label.push_str(&range.text);
            }
            Pending::None => {
                let mut text = TextNode::new();
                text.push(range);
                self.pending = Pending::Text(text);
            }
        }
    }

    fn active_marks(&self) -> Vec<Mark> {
        self.marks
            .iter()
            .filter_map(|markup| Mark::from_markup(markup))
            .collect()
    }

    fn token(&mut self, token: &Token) {
        match token.kind {
            TokenKind::Link if token.is_open() => {
                self.flush();
                self.pending = Pending::Link {
                    label: String::new(),
                    href: token.attr("href").unwrap_or_default().to_string(),
                    title: token
                        .attr("title")
                        .filter(|title| !title.is_empty())
                        .map(str::to_string),
                };
            }
            TokenKind::Abbreviation if token.is_open() => {
                self.flush();
                self.pending = Pending::Abbr {
                    label: String::new(),
                    title: token.attr("title").unwrap_or_default().to_string(),
                };
            }
            TokenKind::Link | TokenKind::Abbreviation => self.flush(),
            TokenKind::Image => self.standalone(InlineNode::Image {
                title: token.content.clone(),
                src: token.attr("src").unwrap_or_default().to_string(),
                alt: token
                    .attr("title")
                    .filter(|alt| !alt.is_empty())
                    .map(str::to_string),
            }),
            TokenKind::Placeholder => self.standalone(InlineNode::AutocompletePlaceholder {
                text: TextNode::from_text(&token.content),
                id: token.meta.get("id").cloned().unwrap_or_default(),
            }),
            TokenKind::SoftBreak => self.standalone(InlineNode::SoftBreak),
            TokenKind::CodeInline => {
                let markup = if token.markup.is_empty() {
                    "`"
                } else {
                    token.markup.as_str()
                };
                let range = TextBlock::marked(&token.content, vec![Mark::new(MarkType::Code, markup)]);
                self.push_range(range);
            }
            TokenKind::Emoji => {
                let range = TextBlock::marked(
                    &token.content,
                    vec![Mark::new(MarkType::Emoji, &token.markup)],
                );
                self.push_range(range);
            }
            TokenKind::Text => {
                if token.content.is_empty() {
                    return;
                }
                let range = TextBlock::marked(&token.content, self.active_marks());
                self.push_range(range);
            }
            _ if token.is_open() && !token.markup.is_empty() => {
                self.marks.insert(token.markup.clone());
            }
            _ if token.is_close() && !token.markup.is_empty() => {
                self.marks.shift_remove(&token.markup);
            }
            _ => {}
        }
    }
}

/// Convert one block's inline tokens into its child nodes.
///
/// Consecutive text runs share one text node; links, abbreviations,
/// placeholders, images and soft breaks each become their own inline node.
pub fn build_inlines(children: &[Token]) -> Vec<Node> {
    let mut builder = InlineBuilder::new();
    for token in children {
        builder.token(token);
    }
    builder.flush();
    builder.nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strong(open: bool) -> Token {
        if open {
            Token::open(TokenKind::Strong, "strong").with_markup("**")
        } else {
            Token::close(TokenKind::Strong, "strong").with_markup("**")
        }
    }

    #[test]
    fn test_marks_apply_to_enclosed_text() {
        let nodes = build_inlines(&[
            Token::text("a "),
            strong(true),
            Token::text("b"),
            strong(false),
            Token::text(" c"),
        ]);
        assert_eq!(nodes.len(), 1);
        let Node::Text(text) = &nodes[0] else {
            panic!("expected text, got {nodes:?}");
        };
        assert_eq!(text.ranges.len(), 3);
        assert!(text.ranges[0].marks.is_empty());
        assert_eq!(text.ranges[1].marks, vec![Mark::new(MarkType::Bold, "**")]);
        assert_eq!(text.ranges[1].text, "b");
        assert!(text.ranges[2].marks.is_empty());
    }

    #[test]
    fn test_nested_marks_outermost_first() {
        let nodes = build_inlines(&[
            strong(true),
            Token::open(TokenKind::Emphasis, "em").with_markup("_"),
            Token::text("x"),
            Token::close(TokenKind::Emphasis, "em").with_markup("_"),
            strong(false),
        ]);
        let Node::Text(text) = &nodes[0] else {
            panic!("expected text");
        };
        let types: Vec<MarkType> = text.ranges[0].marks.iter().map(|m| m.mark_type).collect();
        assert_eq!(types, vec![MarkType::Bold, MarkType::Italic]);
        assert_eq!(text.ranges[0].marks[1].markup(), "_");
    }

    #[test]
    fn test_link_collects_label() {
        let nodes = build_inlines(&[
            Token::text("see "),
            Token::open(TokenKind::Link, "a")
                .with_attr("href", "https://example.com")
                .with_attr("title", "Example"),
            Token::text("here"),
            Token::close(TokenKind::Link, "a"),
            Token::text("."),
        ]);
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[1],
            Node::Inline(InlineNode::Link {
                text: TextNode::from_text("here"),
                href: "https://example.com".to_string(),
                title: Some("Example".to_string()),
            })
        );
    }

    #[test]
    fn test_code_inside_link_joins_label() {
        let nodes = build_inlines(&[
            Token::open(TokenKind::Link, "a").with_attr("href", "/api"),
            Token::text("the "),
            Token::leaf(TokenKind::CodeInline, "code").with_content("parse"),
            Token::close(TokenKind::Link, "a"),
        ]);
        let Node::Inline(InlineNode::Link { text, title, .. }) = &nodes[0] else {
            panic!("expected link");
        };
        assert_eq!(text.plain_text(), "the parse");
        assert_eq!(title, &None);
    }

    #[test]
    fn test_image_fields() {
        let nodes = build_inlines(&[Token::leaf(TokenKind::Image, "img")
            .with_content("logo")
            .with_attr("src", "logo.png")
            .with_attr("title", "Company logo")]);
        assert_eq!(
            nodes,
            vec![Node::Inline(InlineNode::Image {
                title: "logo".to_string(),
                src: "logo.png".to_string(),
                alt: Some("Company logo".to_string()),
            })]
        );
    }

    #[test]
    fn test_softbreak_splits_text() {
        let nodes = build_inlines(&[
            Token::text("one"),
            Token::leaf(TokenKind::SoftBreak, "br"),
            Token::text("two"),
        ]);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], Node::Inline(InlineNode::SoftBreak));
    }

    #[test]
    fn test_placeholder_and_abbreviation() {
        let nodes = build_inlines(&[
            Token::leaf(TokenKind::Placeholder, "autocomplete")
                .with_content("$name")
                .with_meta("id", "variable"),
            Token::text(" in "),
            Token::open(TokenKind::Abbreviation, "abbr").with_attr("title", "Hyper Text"),
            Token::text("HTML"),
            Token::close(TokenKind::Abbreviation, "abbr"),
        ]);
        assert_eq!(
            nodes[0],
            Node::Inline(InlineNode::AutocompletePlaceholder {
                text: TextNode::from_text("$name"),
                id: "variable".to_string(),
            })
        );
        assert_eq!(
            nodes[2],
            Node::Inline(InlineNode::Abbr {
                text: TextNode::from_text("HTML"),
                title: "Hyper Text".to_string(),
            })
        );
    }

    #[test]
    fn test_code_and_emoji_runs() {
        let nodes = build_inlines(&[
            Token::leaf(TokenKind::CodeInline, "code")
                .with_content("x < y")
                .with_markup("`"),
            Token::leaf(TokenKind::Emoji, "")
                .with_content("😄")
                .with_markup("smile"),
        ]);
        let Node::Text(text) = &nodes[0] else {
            panic!("expected text");
        };
        assert_eq!(text.ranges[0].marks[0].mark_type, MarkType::Code);
        assert_eq!(text.ranges[1].marks[0].mark_type, MarkType::Emoji);
        assert_eq!(text.ranges[1].marks[0].markup(), "smile");
    }

    #[test]
    fn test_empty_stream() {
        assert!(build_inlines(&[]).is_empty());
    }
}
