//! Token stream cleanup ahead of tree building.
//!
//! Removes tokens the builder must not see: blank-line markers below the top
//! level, paragraph wrappers inside containers that render their own line
//! structure, and list splits the tokenizer introduces when a nested list
//! switches bullet characters.

use crate::token::{Token, TokenKind};

/// Open container counts while walking the stream
#[derive(Debug, Default)]
struct Depths {
    blockquote: usize,
    bullet_list: usize,
    ordered_list: usize,
    description: usize,
    footnote: usize,
}

impl Depths {
    fn inside_container(&self) -> bool {
        self.blockquote > 0
            || self.bullet_list > 0
            || self.ordered_list > 0
            || self.description > 0
            || self.footnote > 0
    }

    fn counter(&mut self, kind: &TokenKind) -> Option<&mut usize> {
        match kind {
            TokenKind::Blockquote => Some(&mut self.blockquote),
            TokenKind::BulletList => Some(&mut self.bullet_list),
            TokenKind::OrderedList => Some(&mut self.ordered_list),
            TokenKind::DefinitionDescription => Some(&mut self.description),
            TokenKind::Footnote => Some(&mut self.footnote),
            _ => None,
        }
    }

    fn list_depth(&self, kind: &TokenKind) -> usize {
        match kind {
            TokenKind::BulletList => self.bullet_list,
            TokenKind::OrderedList => self.ordered_list,
            _ => 0,
        }
    }

    fn track(&mut self, token: &Token) {
        let open = token.is_open();
        let close = token.is_close();
        if let Some(count) = self.counter(&token.kind) {
            if open {
                *count += 1;
            } else if close {
                *count = count.saturating_sub(1);
            }
        }
    }
}

/// Clean up a token stream in a single forward pass.
pub fn preprocess(tokens: Vec<Token>) -> Vec<Token> {
    let mut depths = Depths::default();
    let mut out = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(mut token) = tokens.next() {
        if token.kind == TokenKind::EmptyLine && token.level > 0 {
            continue;
        }

        if token.kind == TokenKind::Paragraph
            && (token.is_open() || token.is_close())
            && depths.inside_container()
        {
            continue;
        }

        if token.is_close() && depths.list_depth(&token.kind) > 1 {
            let reopens = tokens
                .peek()
                .is_some_and(|next| next.is_open() && next.kind == token.kind);
            if reopens {
                tokens.next();
                continue;
            }
        }

        depths.track(&token);
        if matches!(token.kind, TokenKind::Fence | TokenKind::CodeBlock) {
            strip_trailing_newline(&mut token.content);
        }
        out.push(token);
    }

    out
}

fn strip_trailing_newline(content: &mut String) {
    if content.ends_with("\r\n") {
        content.truncate(content.len() - 2);
    } else if content.ends_with('\n') {
        content.pop();
    }
}
