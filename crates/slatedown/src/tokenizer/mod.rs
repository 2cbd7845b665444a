//! Default tokenizer built on pulldown-cmark.
//!
//! pulldown-cmark events are walked into flat open/close/leaf tokens with
//! nesting levels. Things the event stream does not carry directly are
//! recovered from source offsets (bullet characters, emphasis delimiters,
//! fence strings) or added by the passes in [`inline`].

mod inline;
mod source;

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options as CmarkOptions, Parser, Tag};
use regex::Regex;

use crate::options::ParseOptions;
use crate::token::{Token, TokenKind, Tokenize};
use crate::TokenizeError;
use inline::{InlineRules, Piece};

/// Tokenizer for the supported Markdown subset
#[derive(Debug, Clone, Default)]
pub struct MarkdownTokenizer {
    placeholders: Vec<(Regex, String)>,
}

impl MarkdownTokenizer {
    /// Create a tokenizer, compiling the placeholder patterns
    pub fn new(options: &ParseOptions) -> Result<Self, TokenizeError> {
        let placeholders = options
            .placeholders
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|pattern| (pattern, rule.identifier.clone()))
                    .map_err(|source| TokenizeError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { placeholders })
    }
}

fn cmark_options() -> CmarkOptions {
    let mut options = CmarkOptions::empty();
    options.insert(CmarkOptions::ENABLE_TABLES);
    options.insert(CmarkOptions::ENABLE_FOOTNOTES);
    options.insert(CmarkOptions::ENABLE_STRIKETHROUGH);
    options.insert(CmarkOptions::ENABLE_SUPERSCRIPT);
    options.insert(CmarkOptions::ENABLE_SUBSCRIPT);
    options.insert(CmarkOptions::ENABLE_DEFINITION_LIST);
    options
}

impl Tokenize for MarkdownTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let prepared = source::prepare(text);
        let rules = InlineRules::new(self.placeholders.clone())
            .with_abbreviations(&prepared.abbreviations)?;

        let mut walker = Walker::new(&prepared.text, &rules);
        for (event, range) in Parser::new_ext(&prepared.text, cmark_options()).into_offset_iter() {
            walker.event(event, range);
        }
        let mut tokens = walker.finish()?;

        for (label, title) in &prepared.abbreviations {
            tokens.push(
                Token::leaf(TokenKind::AbbreviationDefinition, "abbr-def")
                    .with_meta("label", label)
                    .with_attr("title", title),
            );
        }

        log::debug!("tokenized {} bytes into {} tokens", text.len(), tokens.len());
        Ok(tokens)
    }
}

/// Open construct awaiting its `End` event
enum Frame {
    /// Block tokens already emitted; `closes` are emitted in order on `End`
    Block { kind: TokenKind, closes: Vec<Token> },
    Table { body_open: bool },
    /// Inline construct; its close token, if any, goes to the inline stream
    Inline(Option<Token>),
    Image,
    /// Code block leaf, filled by text events
    Code(Token),
    /// Raw HTML block, kept as the text of a paragraph
    Html(String),
}

struct ImageState {
    src: String,
    title: String,
    alt: String,
}

/// Last top-level block, for counting the blank lines after it
struct TopBlock {
    end: usize,
    /// Line breaks the serializer writes after this block on its own
    trailing: usize,
}

struct Walker<'a> {
    source: &'a str,
    rules: &'a InlineRules,
    tokens: Vec<Token>,
    frames: Vec<Frame>,
    pending: Vec<Piece>,
    depth: usize,
    image: Option<ImageState>,
    in_table_head: bool,
    last_top: Option<TopBlock>,
}

impl<'a> Walker<'a> {
    fn new(source: &'a str, rules: &'a InlineRules) -> Self {
        Self {
            source,
            rules,
            tokens: Vec::new(),
            frames: Vec::new(),
            pending: Vec::new(),
            depth: 0,
            image: None,
            in_table_head: false,
            last_top: None,
        }
    }

    fn finish(mut self) -> Result<Vec<Token>, TokenizeError> {
        self.flush_inline();
        if !self.frames.is_empty() {
            return Err(TokenizeError::Failed(format!(
                "{} construct(s) left open",
                self.frames.len()
            )));
        }
        Ok(self.tokens)
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(_) => self.end(range),
            Event::Text(text) => self.text(&text, range),
            Event::Code(code) => self.code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.html(&html),
            Event::FootnoteReference(label) => self.push_text(&format!("[^{label}]")),
            Event::SoftBreak | Event::HardBreak => self.soft_break(),
            Event::Rule => self.rule(range),
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " })
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        match tag {
            Tag::Paragraph => {
                self.open_block(&range, (0, 1), vec![Token::open(TokenKind::Paragraph, "p")])
            }
            Tag::Heading { level, .. } => {
                let n = level as usize;
                let heading = Token::open(TokenKind::Heading, &format!("h{n}"))
                    .with_markup(&"#".repeat(n));
                self.open_block(&range, (0, 0), vec![heading]);
            }
            Tag::BlockQuote(..) => {
                let quote = Token::open(TokenKind::Blockquote, "blockquote").with_markup(">");
                self.open_block(&range, (1, 0), vec![quote]);
            }
            Tag::List(Some(start)) => {
                let mut list = Token::open(TokenKind::OrderedList, "ol");
                if start != 1 {
                    list = list.with_attr("start", &start.to_string());
                }
                self.open_block(&range, (1, 1), vec![list]);
            }
            Tag::List(None) => {
                self.open_block(&range, (1, 1), vec![Token::open(TokenKind::BulletList, "ul")])
            }
            Tag::Item => {
                let markup = self.item_markup(range.start);
                let item = Token::open(TokenKind::ListItem, "li").with_markup(&markup);
                self.open_block(&range, (0, 0), vec![item]);
            }
            Tag::Table(..) => {
                self.flush_inline();
                self.start_top_block(range.start, (0, 0));
                self.emit_open(Token::open(TokenKind::Table, "table"));
                self.frames.push(Frame::Table { body_open: false });
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open_block(
                    &range,
                    (0, 0),
                    vec![
                        Token::open(TokenKind::TableHead, "thead"),
                        Token::open(TokenKind::TableRow, "tr"),
                    ],
                );
            }
            Tag::TableRow => {
                self.open_table_body();
                self.open_block(&range, (0, 0), vec![Token::open(TokenKind::TableRow, "tr")]);
            }
            Tag::TableCell => {
                let cell = if self.in_table_head {
                    Token::open(TokenKind::TableHeaderCell, "th")
                } else {
                    Token::open(TokenKind::TableCell, "td")
                };
                self.open_block(&range, (0, 0), vec![cell]);
            }
            Tag::DefinitionList => self.open_block(
                &range,
                (0, 1),
                vec![Token::open(TokenKind::DefinitionList, "dl")],
            ),
            Tag::DefinitionListTitle => self.open_block(
                &range,
                (0, 0),
                vec![Token::open(TokenKind::DefinitionTerm, "dt")],
            ),
            Tag::DefinitionListDefinition => self.open_block(
                &range,
                (0, 0),
                vec![Token::open(TokenKind::DefinitionDescription, "dd").with_markup(":")],
            ),
            Tag::FootnoteDefinition(label) => {
                let anchor = Token::open(TokenKind::Footnote, "anchor").with_meta("label", &label);
                self.open_block(&range, (0, 0), vec![anchor]);
            }
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                self.start_top_block(range.start, (0, 1));
                let mut code = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let mut fence = Token::leaf(TokenKind::Fence, "code")
                            .with_markup(&self.fence_markup(range.start));
                        if !info.is_empty() {
                            fence = fence.with_attr("info", &info);
                        }
                        fence
                    }
                    CodeBlockKind::Indented => Token::leaf(TokenKind::CodeBlock, "code"),
                };
                code.level = self.depth;
                self.frames.push(Frame::Code(code));
            }
            Tag::HtmlBlock => {
                self.flush_inline();
                self.start_top_block(range.start, (0, 1));
                self.emit_open(Token::open(TokenKind::Paragraph, "p"));
                self.frames.push(Frame::Html(String::new()));
            }
            Tag::Emphasis => {
                let markup = self.delimiter_at(range.start, &['*', '_'], 1);
                self.open_inline(TokenKind::Emphasis, "em", &markup);
            }
            Tag::Strong => {
                let markup = self.delimiter_at(range.start, &['*', '_'], 2);
                self.open_inline(TokenKind::Strong, "strong", &markup);
            }
            Tag::Strikethrough => {
                let markup = self.delimiter_at(range.start, &['~'], 2);
                self.open_inline(TokenKind::Strikethrough, "s", &markup);
            }
            Tag::Superscript => self.open_inline(TokenKind::Superscript, "sup", "^"),
            Tag::Subscript => self.open_inline(TokenKind::Subscript, "sub", "~"),
            Tag::Link {
                dest_url, title, ..
            } => {
                if self.image.is_some() {
                    self.frames.push(Frame::Inline(None));
                    return;
                }
                let mut link = Token::open(TokenKind::Link, "a").with_attr("href", &dest_url);
                if !title.is_empty() {
                    link = link.with_attr("title", &title);
                }
                self.pending.push(Piece::Token(link));
                self.frames
                    .push(Frame::Inline(Some(Token::close(TokenKind::Link, "a"))));
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                if self.image.is_some() {
                    self.frames.push(Frame::Inline(None));
                    return;
                }
                self.image = Some(ImageState {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
                self.frames.push(Frame::Image);
            }
            _ => self.frames.push(Frame::Inline(None)),
        }
    }

    fn end(&mut self, range: Range<usize>) {
        let Some(frame) = self.frames.pop() else {
            return;
        };

        match frame {
            Frame::Block { kind, closes } => {
                self.flush_inline();
                for close in closes {
                    self.emit_close(close);
                }
                if kind == TokenKind::TableHead {
                    self.in_table_head = false;
                }
            }
            Frame::Table { body_open } => {
                self.flush_inline();
                if body_open {
                    self.emit_close(Token::close(TokenKind::TableBody, "tbody"));
                }
                self.emit_close(Token::close(TokenKind::Table, "table"));
            }
            Frame::Inline(close) => {
                if let Some(close) = close {
                    self.pending.push(Piece::Token(close));
                }
                return;
            }
            Frame::Image => {
                if let Some(image) = self.image.take() {
                    let mut token = Token::leaf(TokenKind::Image, "img")
                        .with_content(&image.alt)
                        .with_attr("src", &image.src);
                    if !image.title.is_empty() {
                        token = token.with_attr("title", &image.title);
                    }
                    self.pending.push(Piece::Token(token));
                }
                return;
            }
            Frame::Code(code) => self.tokens.push(code),
            Frame::Html(html) => {
                let text = html.trim_end_matches(['\n', '\r']);
                if !text.is_empty() {
                    self.pending.push(Piece::Token(Token::text(text)));
                }
                self.flush_inline();
                self.emit_close(Token::close(TokenKind::Paragraph, "p"));
            }
        }

        if self.depth == 0 {
            if let Some(top) = &mut self.last_top {
                top.end = range.end;
            }
        }
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        match self.frames.last_mut() {
            Some(Frame::Code(code)) => {
                code.content.push_str(text);
                return;
            }
            Some(Frame::Html(html)) => {
                html.push_str(text);
                return;
            }
            _ => {}
        }
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
            return;
        }

        let escaped = range.start > 0 && self.source.as_bytes().get(range.start - 1) == Some(&b'\\');
        if !escaped && self.source.get(range.clone()) == Some(text) {
            inline::split_delimiters(text, self.source, range.start, &mut self.pending);
        } else {
            self.pending.push(Piece::Token(Token::text(text)));
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
            return;
        }
        self.pending.push(Piece::Token(Token::text(text)));
    }

    fn code(&mut self, code: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(code);
            return;
        }
        let token = Token::leaf(TokenKind::CodeInline, "code")
            .with_content(code)
            .with_markup("`");
        self.pending.push(Piece::Token(token));
    }

    fn html(&mut self, html: &str) {
        if let Some(Frame::Html(buffer)) = self.frames.last_mut() {
            buffer.push_str(html);
            return;
        }
        self.push_text(html);
    }

    fn soft_break(&mut self) {
        if let Some(image) = &mut self.image {
            image.alt.push(' ');
            return;
        }
        self.pending
            .push(Piece::Token(Token::leaf(TokenKind::SoftBreak, "br")));
    }

    fn rule(&mut self, range: Range<usize>) {
        self.flush_inline();
        self.start_top_block(range.start, (0, 0));

        let markup = self
            .source
            .get(range.clone())
            .and_then(|s| s.lines().next())
            .map_or("", str::trim);
        let rule = Token::leaf(TokenKind::HorizontalRule, "hr")
            .with_markup(markup)
            .with_level(self.depth);
        self.tokens.push(rule);

        if self.depth == 0 {
            if let Some(top) = &mut self.last_top {
                top.end = range.end;
            }
        }
    }

    fn open_block(&mut self, range: &Range<usize>, layout: (usize, usize), opens: Vec<Token>) {
        self.flush_inline();
        self.start_top_block(range.start, layout);

        let kind = opens
            .first()
            .map_or(TokenKind::Paragraph, |open| open.kind.clone());
        let mut closes = Vec::with_capacity(opens.len());
        for open in opens {
            closes.insert(
                0,
                Token::close(open.kind.clone(), &open.tag).with_markup(&open.markup),
            );
            self.emit_open(open);
        }
        self.frames.push(Frame::Block { kind, closes });
    }

    fn open_inline(&mut self, kind: TokenKind, tag: &str, markup: &str) {
        if self.image.is_some() {
            self.frames.push(Frame::Inline(None));
            return;
        }
        self.pending
            .push(Piece::Token(Token::open(kind.clone(), tag).with_markup(markup)));
        self.frames.push(Frame::Inline(Some(
            Token::close(kind, tag).with_markup(markup),
        )));
    }

    fn open_table_body(&mut self) {
        let Some(Frame::Table { body_open }) = self.frames.last_mut() else {
            return;
        };
        if *body_open {
            return;
        }
        *body_open = true;

        // a table with a body ends with a line break of its own
        if self.depth == 1 {
            if let Some(top) = &mut self.last_top {
                top.trailing = 1;
            }
        }
        self.emit_open(Token::open(TokenKind::TableBody, "tbody"));
    }

    /// Emit blank-line tokens before a new top-level block
    fn start_top_block(&mut self, start: usize, (leading, trailing): (usize, usize)) {
        if self.depth != 0 {
            return;
        }
        if let Some(prev) = &self.last_top {
            let blanks = source::blank_lines_between(self.source, prev.end, start);
            for _ in 0..blanks.saturating_sub(prev.trailing + leading) {
                self.tokens.push(Token::leaf(TokenKind::EmptyLine, "empty"));
            }
        }
        self.last_top = Some(TopBlock {
            end: start,
            trailing,
        });
    }

    fn flush_inline(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pieces = std::mem::take(&mut self.pending);
        let children = self.rules.finish(pieces);
        if children.is_empty() {
            return;
        }
        self.tokens
            .push(Token::inline(children).with_level(self.depth));
    }

    fn emit_open(&mut self, mut token: Token) {
        token.level = self.depth;
        self.tokens.push(token);
        self.depth += 1;
    }

    fn emit_close(&mut self, mut token: Token) {
        self.depth = self.depth.saturating_sub(1);
        token.level = self.depth;
        self.tokens.push(token);
    }

    /// Bullet character, or `.`/`)` for ordered items
    fn item_markup(&self, start: usize) -> String {
        let ordered = matches!(
            self.frames.last(),
            Some(Frame::Block { kind: TokenKind::OrderedList, .. })
        );
        let rest = self.source.get(start..).unwrap_or_default();
        let mut chars = rest
            .chars()
            .skip_while(|c| c.is_whitespace() || *c == '>')
            .peekable();

        if ordered {
            while chars.next_if(char::is_ascii_digit).is_some() {}
            return match chars.next() {
                Some(c @ ('.' | ')')) => c.to_string(),
                _ => String::new(),
            };
        }
        match chars.next() {
            Some(c @ ('-' | '+' | '*')) => c.to_string(),
            _ => String::new(),
        }
    }

    /// Run of one of `chars` at `start`, at most `max` long
    fn delimiter_at(&self, start: usize, chars: &[char], max: usize) -> String {
        let rest = self.source.get(start..).unwrap_or_default();
        let Some(first) = rest.chars().next().filter(|c| chars.contains(c)) else {
            return chars.first().map_or(String::new(), |c| c.to_string().repeat(max));
        };
        let count = rest.chars().take_while(|&c| c == first).count().min(max);
        first.to_string().repeat(count)
    }

    fn fence_markup(&self, start: usize) -> String {
        let rest = self.source.get(start..).unwrap_or_default().trim_start();
        let Some(first) = rest.chars().next().filter(|c| *c == '`' || *c == '~') else {
            return "```".to_string();
        };
        rest.chars().take_while(|&c| c == first).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Nesting;

    fn tokenize(text: &str) -> Vec<Token> {
        MarkdownTokenizer::default().tokenize(text).unwrap()
    }

    fn outline(tokens: &[Token]) -> Vec<(String, Nesting, usize)> {
        tokens
            .iter()
            .map(|t| (t.tag.clone(), t.nesting, t.level))
            .collect()
    }

    #[test]
    fn test_heading() {
        let tokens = tokenize("## Title");
        assert_eq!(
            outline(&tokens),
            vec![
                ("h2".to_string(), Nesting::Open, 0),
                (String::new(), Nesting::Leaf, 1),
                ("h2".to_string(), Nesting::Close, 0),
            ]
        );
        assert_eq!(tokens[1].children[0].content, "Title");
    }

    #[test]
    fn test_bullet_markup_is_recorded() {
        let tokens = tokenize("- a\n- b\n");
        let items: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::ListItem && t.is_open())
            .map(|t| t.markup.as_str())
            .collect();
        assert_eq!(items, vec!["-", "-"]);
    }

    #[test]
    fn test_ordered_list_start() {
        let tokens = tokenize("3. a\n4. b\n");
        assert_eq!(tokens[0].kind, TokenKind::OrderedList);
        assert_eq!(tokens[0].attr("start"), Some("3"));
        assert_eq!(tokens[1].markup, ".");
    }

    #[test]
    fn test_emphasis_markup_follows_source() {
        let tokens = tokenize("__a__ and _b_");
        let inline = &tokens[1].children;
        assert_eq!(inline[0].kind, TokenKind::Strong);
        assert_eq!(inline[0].markup, "__");
        let em = inline.iter().find(|t| t.kind == TokenKind::Emphasis).unwrap();
        assert_eq!(em.markup, "_");
    }

    #[test]
    fn test_fence() {
        let tokens = tokenize("```rust\nlet a = 1;\n```\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Fence);
        assert_eq!(tokens[0].markup, "```");
        assert_eq!(tokens[0].attr("info"), Some("rust"));
        assert_eq!(tokens[0].content, "let a = 1;\n");
    }

    #[test]
    fn test_table_structure() {
        let tokens = tokenize("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let tags: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_open())
            .map(|t| t.tag.as_str())
            .collect();
        assert_eq!(
            tags,
            vec!["table", "thead", "tr", "th", "th", "tbody", "tr", "td", "td"]
        );
    }

    #[test]
    fn test_blank_lines_become_empty_tokens() {
        let tokens = tokenize("a\n\n\n\nb\n");
        let empties = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::EmptyLine)
            .count();
        assert_eq!(empties, 2);
    }

    #[test]
    fn test_single_blank_line_is_separation() {
        let tokens = tokenize("a\n\nb\n");
        assert!(tokens.iter().all(|t| t.kind != TokenKind::EmptyLine));
    }

    #[test]
    fn test_abbreviations() {
        let tokens = tokenize("Read the HTML standard.\n\n*[HTML]: Hyper Text Markup Language\n");
        let inline = &tokens[1].children;
        assert!(inline
            .iter()
            .any(|t| t.kind == TokenKind::Abbreviation && t.attr("title") == Some("Hyper Text Markup Language")));

        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::AbbreviationDefinition);
        assert_eq!(last.meta.get("label").map(String::as_str), Some("HTML"));
    }

    #[test]
    fn test_image_alt_is_content() {
        let tokens = tokenize("![logo](logo.png \"Company\")");
        let image = &tokens[1].children[0];
        assert_eq!(image.kind, TokenKind::Image);
        assert_eq!(image.content, "logo");
        assert_eq!(image.attr("src"), Some("logo.png"));
        assert_eq!(image.attr("title"), Some("Company"));
    }

    #[test]
    fn test_invalid_placeholder_pattern() {
        let options = ParseOptions::default().with_placeholder("(", "broken");
        assert!(matches!(
            MarkdownTokenizer::new(&options),
            Err(TokenizeError::InvalidPattern { .. })
        ));
    }
}
