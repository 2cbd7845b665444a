//! Inline passes run over one block's inline stream after the Markdown
//! parser: `==`/`++` pairing, text joining, typography, placeholders,
//! abbreviations and emoji shortcodes.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::{Nesting, Token, TokenKind};
use crate::TokenizeError;

static TYPOGRAPHIC_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((c|r|tm|p)\)").expect("symbol pattern is valid"));

static EMOJI_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([a-z0-9_+\-]+):").expect("emoji pattern is valid"));

const EMOJI: &[(&str, &str)] = &[
    ("smile", "😄"),
    ("smiley", "😃"),
    ("grinning", "😀"),
    ("laughing", "😆"),
    ("wink", "😉"),
    ("blush", "😊"),
    ("cry", "😢"),
    ("heart", "❤️"),
    ("+1", "👍"),
    ("thumbsup", "👍"),
    ("-1", "👎"),
    ("thumbsdown", "👎"),
    ("tada", "🎉"),
    ("rocket", "🚀"),
    ("fire", "🔥"),
    ("star", "⭐"),
    ("warning", "⚠️"),
    ("white_check_mark", "✅"),
    ("x", "❌"),
    ("bulb", "💡"),
];

/// Delimiters recognized here rather than by the Markdown parser
const PAIRED_DELIMITERS: &[&str] = &["==", "++"];

/// Token kind and tag a paired delimiter opens
fn delimiter_kind(markup: &str) -> (TokenKind, &'static str) {
    match markup {
        "==" => (TokenKind::Highlight, "mark"),
        _ => (TokenKind::Insert, "ins"),
    }
}

/// One element of an inline stream under construction
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Token(Token),
    Delimiter {
        markup: &'static str,
        can_open: bool,
        can_close: bool,
    },
}

/// Compiled per-document inline settings
#[derive(Debug, Clone, Default)]
pub struct InlineRules {
    placeholders: Vec<(Regex, String)>,
    abbreviations: Option<Abbreviations>,
}

#[derive(Debug, Clone)]
struct Abbreviations {
    pattern: Regex,
    titles: Vec<(String, String)>,
}

impl InlineRules {
    pub fn new(placeholders: Vec<(Regex, String)>) -> Self {
        Self {
            placeholders,
            abbreviations: None,
        }
    }

    /// Add the abbreviations defined in the current document
    pub fn with_abbreviations(
        mut self,
        definitions: &[(String, String)],
    ) -> Result<Self, TokenizeError> {
        if definitions.is_empty() {
            return Ok(self);
        }

        let mut labels: Vec<&str> = definitions.iter().map(|(label, _)| label.as_str()).collect();
        labels.sort_by_key(|label| std::cmp::Reverse(label.len()));
        let alternation = labels
            .iter()
            .map(|label| regex::escape(label))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation).map_err(|source| TokenizeError::InvalidPattern {
            pattern: alternation.clone(),
            source,
        })?;

        self.abbreviations = Some(Abbreviations {
            pattern,
            titles: definitions.to_vec(),
        });
        Ok(self)
    }

    /// Run every pass over a block's pieces
    pub fn finish(&self, pieces: Vec<Piece>) -> Vec<Token> {
        let mut tokens = merge_text(pair_delimiters(pieces));
        tokens = map_text(tokens, |token| vec![replace_typography(token)]);
        for (pattern, identifier) in &self.placeholders {
            tokens = map_text(tokens, |token| split_placeholders(token, pattern, identifier));
        }
        if let Some(abbreviations) = &self.abbreviations {
            tokens = map_text(tokens, |token| split_abbreviations(token, abbreviations));
        }
        map_text(tokens, split_emoji)
    }
}

/// Split raw text at `==` and `++`, recording which side each delimiter can
/// attach to. `offset` is the byte position of `text` within `source`.
pub fn split_delimiters(text: &str, source: &str, offset: usize, out: &mut Vec<Piece>) {
    let mut last = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(markup) = PAIRED_DELIMITERS
            .iter()
            .copied()
            .find(|markup| rest.starts_with(*markup))
        else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };

        if last < pos {
            out.push(Piece::Token(Token::text(&text[last..pos])));
        }

        let at = offset + pos;
        let before = source.get(..at).and_then(|s| s.chars().next_back());
        let after = source.get(at + markup.len()..).and_then(|s| s.chars().next());
        out.push(Piece::Delimiter {
            markup,
            can_open: after.is_some_and(|c| !c.is_whitespace()),
            can_close: before.is_some_and(|c| !c.is_whitespace()),
        });

        pos += markup.len();
        last = pos;
    }

    if last < text.len() {
        out.push(Piece::Token(Token::text(&text[last..])));
    }
}

/// Turn matched delimiter pairs into open/close tokens; the rest is text
fn pair_delimiters(pieces: Vec<Piece>) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pieces.len());
    let mut openers: Vec<(usize, &'static str)> = Vec::new();
    let mut pairs: Vec<(usize, usize, &'static str)> = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Token(token) => tokens.push(token),
            Piece::Delimiter {
                markup,
                can_open,
                can_close,
            } => {
                let index = tokens.len();
                tokens.push(Token::text(markup));

                let opener = openers.iter().rposition(|(_, m)| *m == markup);
                match opener {
                    Some(at) if can_close => {
                        let (open_index, _) = openers[at];
                        openers.truncate(at);
                        pairs.push((open_index, index, markup));
                    }
                    _ if can_open => openers.push((index, markup)),
                    _ => {}
                }
            }
        }
    }

    for (open, close, markup) in pairs {
        let (kind, tag) = delimiter_kind(markup);
        tokens[open] = Token::open(kind.clone(), tag).with_markup(markup);
        tokens[close] = Token::close(kind, tag).with_markup(markup);
    }

    tokens
}

/// Join adjacent text tokens
fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.kind == TokenKind::Text {
            if let Some(prev) = out.last_mut().filter(|prev| prev.kind == TokenKind::Text) {
                prev.content.push_str(&token.content);
                continue;
            }
        }
        out.push(token);
    }
    out
}

/// Apply `f` to every text token outside links
fn map_text<F>(tokens: Vec<Token>, mut f: F) -> Vec<Token>
where
    F: FnMut(Token) -> Vec<Token>,
{
    let mut out = Vec::with_capacity(tokens.len());
    let mut link_depth = 0usize;

    for token in tokens {
        if token.kind == TokenKind::Text && link_depth == 0 {
            out.extend(f(token));
            continue;
        }
        if token.kind == TokenKind::Link {
            match token.nesting {
                Nesting::Open => link_depth += 1,
                Nesting::Close => link_depth = link_depth.saturating_sub(1),
                Nesting::Leaf => {}
            }
        }
        out.push(token);
    }

    out
}

fn replace_typography(mut token: Token) -> Token {
    let content = TYPOGRAPHIC_SYMBOL.replace_all(&token.content, |caps: &regex::Captures<'_>| {
        match caps[1].to_ascii_lowercase().as_str() {
            "c" => "©",
            "r" => "®",
            "tm" => "™",
            _ => "§",
        }
    });
    token.content = content
        .replace("+-", "±")
        .replace("...", "…")
        .replace("---", "—")
        .replace("--", "–");
    token
}

/// Split a text token around `matches`, turning each match into a token
fn split_at(token: Token, matches: Vec<(Range<usize>, Vec<Token>)>) -> Vec<Token> {
    if matches.is_empty() {
        return vec![token];
    }

    let text = token.content;
    let mut out = Vec::new();
    let mut last = 0;
    for (range, replacement) in matches {
        if last < range.start {
            out.push(Token::text(&text[last..range.start]));
        }
        out.extend(replacement);
        last = range.end;
    }
    if last < text.len() {
        out.push(Token::text(&text[last..]));
    }
    out
}

fn split_placeholders(token: Token, pattern: &Regex, identifier: &str) -> Vec<Token> {
    let matches = pattern
        .find_iter(&token.content)
        .filter(|m| !m.as_str().is_empty())
        .map(|m| {
            let placeholder = Token::leaf(TokenKind::Placeholder, "autocomplete")
                .with_content(m.as_str())
                .with_meta("id", identifier);
            (m.range(), vec![placeholder])
        })
        .collect();
    split_at(token, matches)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_abbreviations(token: Token, abbreviations: &Abbreviations) -> Vec<Token> {
    let text = &token.content;
    let matches = abbreviations
        .pattern
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
        .filter_map(|m| {
            let (label, title) = abbreviations.titles.iter().find(|(l, _)| l == m.as_str())?;
            let tokens = vec![
                Token::open(TokenKind::Abbreviation, "abbr").with_attr("title", title),
                Token::text(label),
                Token::close(TokenKind::Abbreviation, "abbr"),
            ];
            Some((m.range(), tokens))
        })
        .collect();
    split_at(token, matches)
}

fn split_emoji(token: Token) -> Vec<Token> {
    let matches = EMOJI_SHORTCODE
        .captures_iter(&token.content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            let (_, glyph) = EMOJI.iter().find(|(n, _)| *n == name)?;
            let emoji = Token::leaf(TokenKind::Emoji, "")
                .with_content(glyph)
                .with_markup(name);
            Some((whole.range(), vec![emoji]))
        })
        .collect();
    split_at(token, matches)
}
