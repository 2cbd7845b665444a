//! Token stream consumed by the tree builder.
//!
//! Tokens are flat open/close/leaf events. Block tokens carry their nesting
//! `level` (0 at the top); an `Inline` token carries one block's inline
//! sub-stream in `children`.

use indexmap::IndexMap;

use crate::TokenizeError;

/// What a token stands for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // containers
    Heading,
    Paragraph,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableCell,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Footnote,

    // block leaves
    Inline,
    Fence,
    CodeBlock,
    HorizontalRule,
    EmptyLine,
    AbbreviationDefinition,

    // inline
    Text,
    CodeInline,
    Emoji,
    SoftBreak,
    Link,
    Image,
    Abbreviation,
    Placeholder,
    Strong,
    Emphasis,
    Strikethrough,
    Superscript,
    Subscript,
    Insert,
    Highlight,

    /// Anything a host tokenizer emits that has no dedicated kind
    Other(String),
}

impl TokenKind {
    /// Kinds whose open/close pair toggles a style mark
    pub fn is_mark(&self) -> bool {
        matches!(
            self,
            TokenKind::Strong
                | TokenKind::Emphasis
                | TokenKind::Strikethrough
                | TokenKind::Superscript
                | TokenKind::Subscript
                | TokenKind::Insert
                | TokenKind::Highlight
        )
    }
}

/// Whether a token opens, closes, or is self-contained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    Open,
    Close,
    Leaf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub nesting: Nesting,
    /// Markup tag that selects the block type (`h1`, `p`, `ul`, `code`, ...)
    pub tag: String,
    pub level: usize,
    pub content: String,
    /// Literal source delimiter (`**`, `-`, a fence string, ...)
    pub markup: String,
    pub attrs: Vec<(String, String)>,
    pub meta: IndexMap<String, String>,
    pub children: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind, nesting: Nesting, tag: &str) -> Self {
        Self {
            kind,
            nesting,
            tag: tag.to_string(),
            level: 0,
            content: String::new(),
            markup: String::new(),
            attrs: Vec::new(),
            meta: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn open(kind: TokenKind, tag: &str) -> Self {
        Self::new(kind, Nesting::Open, tag)
    }

    pub fn close(kind: TokenKind, tag: &str) -> Self {
        Self::new(kind, Nesting::Close, tag)
    }

    pub fn leaf(kind: TokenKind, tag: &str) -> Self {
        Self::new(kind, Nesting::Leaf, tag)
    }

    pub fn text(content: &str) -> Self {
        Self::leaf(TokenKind::Text, "").with_content(content)
    }

    /// An inline token wrapping a block's inline children
    pub fn inline(children: Vec<Token>) -> Self {
        let content = children
            .iter()
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| t.content.as_str())
            .collect();
        let mut token = Self::leaf(TokenKind::Inline, "");
        token.content = content;
        token.children = children;
        token
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn with_markup(mut self, markup: &str) -> Self {
        self.markup = markup.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_meta(mut self, name: &str, value: &str) -> Self {
        self.meta.insert(name.to_string(), value.to_string());
        self
    }

    /// First attribute with the given name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.nesting == Nesting::Open
    }

    pub fn is_close(&self) -> bool {
        self.nesting == Nesting::Close
    }
}

/// Turns Markdown text into a token stream
pub trait Tokenize {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let token = Token::open(TokenKind::OrderedList, "ol")
            .with_level(2)
            .with_attr("start", "3")
            .with_meta("label", "x");
        assert!(token.is_open());
        assert_eq!(token.level, 2);
        assert_eq!(token.attr("start"), Some("3"));
        assert_eq!(token.attr("missing"), None);
        assert_eq!(token.meta.get("label").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_inline_content_joins_text() {
        let inline = Token::inline(vec![
            Token::text("a "),
            Token::open(TokenKind::Strong, "strong").with_markup("**"),
            Token::text("b"),
            Token::close(TokenKind::Strong, "strong").with_markup("**"),
        ]);
        assert_eq!(inline.content, "a b");
        assert_eq!(inline.children.len(), 4);
    }

    #[test]
    fn test_mark_kinds() {
        assert!(TokenKind::Highlight.is_mark());
        assert!(!TokenKind::Link.is_mark());
    }
}
