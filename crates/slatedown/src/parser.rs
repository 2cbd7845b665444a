//! Parse entry points.

use slatedown_core::Document;

use crate::builder::build_blocks;
use crate::options::ParseOptions;
use crate::postprocess::postprocess;
use crate::preprocess::preprocess;
use crate::token::{Token, Tokenize};
use crate::tokenizer::MarkdownTokenizer;
use crate::{BuildError, Result};

/// Parse Markdown into a document, never failing.
///
/// Empty input, a tokenizer error, a tree that cannot be assembled, or a
/// source with no blocks all produce [`Document::empty`].
pub fn parse(text: &str, options: &ParseOptions) -> Document {
    if text.is_empty() {
        return Document::empty();
    }
    match try_parse(text, options) {
        Ok(document) => document,
        Err(err) => {
            log::warn!("markdown parse failed, using empty document: {err}");
            Document::empty()
        }
    }
}

/// Parse Markdown into a document, surfacing errors.
pub fn try_parse(text: &str, options: &ParseOptions) -> Result<Document> {
    let tokenizer = MarkdownTokenizer::new(options)?;
    let tokens = tokenizer.tokenize(text)?;
    Ok(build_document(tokens)?)
}

/// Parse with a caller-supplied tokenizer, never failing.
pub fn parse_with<T: Tokenize + ?Sized>(tokenizer: &T, text: &str) -> Document {
    if text.is_empty() {
        return Document::empty();
    }
    let built = tokenizer
        .tokenize(text)
        .map_err(crate::ParseError::from)
        .and_then(|tokens| build_document(tokens).map_err(crate::ParseError::from));
    match built {
        Ok(document) => document,
        Err(err) => {
            log::warn!("markdown parse failed, using empty document: {err}");
            Document::empty()
        }
    }
}

/// Run preprocessing, tree building and postprocessing over a token stream.
pub fn build_document(tokens: Vec<Token>) -> std::result::Result<Document, BuildError> {
    let tokens = preprocess(tokens);
    let mut blocks = build_blocks(&tokens)?;
    postprocess(&mut blocks);
    log::debug!("built {} top-level block(s) from {} token(s)", blocks.len(), tokens.len());

    if blocks.is_empty() {
        return Ok(Document::empty());
    }
    Ok(Document::new(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use crate::{BlockType, Node, TokenizeError};

    struct FailingTokenizer;

    impl Tokenize for FailingTokenizer {
        fn tokenize(&self, _text: &str) -> std::result::Result<Vec<Token>, TokenizeError> {
            Err(TokenizeError::Failed("boom".to_string()))
        }
    }

    struct FixedTokenizer(Vec<Token>);

    impl Tokenize for FixedTokenizer {
        fn tokenize(&self, _text: &str) -> std::result::Result<Vec<Token>, TokenizeError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("", &ParseOptions::default()), Document::empty());
    }

    #[test]
    fn test_tokenizer_failure_falls_back() {
        assert_eq!(parse_with(&FailingTokenizer, "# hi"), Document::empty());
    }

    #[test]
    fn test_build_failure_falls_back() {
        let broken = FixedTokenizer(vec![Token::close(TokenKind::Paragraph, "p")]);
        assert_eq!(parse_with(&broken, "text"), Document::empty());
    }

    #[test]
    fn test_no_blocks_falls_back() {
        assert_eq!(parse_with(&FixedTokenizer(Vec::new()), "text"), Document::empty());
    }

    #[test]
    fn test_invalid_placeholder_is_reported() {
        let options = ParseOptions::default().with_placeholder("(", "broken");
        assert!(try_parse("text", &options).is_err());
        assert_eq!(parse("text", &options), Document::empty());
    }

    #[test]
    fn test_parse_paragraph() {
        let doc = parse("Hello *world*", &ParseOptions::default());
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].block_type, BlockType::Paragraph);
        let Node::Text(text) = &doc.nodes[0].nodes[0] else {
            panic!("expected text");
        };
        assert_eq!(text.plain_text(), "Hello world");
    }
}
