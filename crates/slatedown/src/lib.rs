//! # slatedown
//!
//! Convert Markdown to an editable document tree and back.
//!
//! ## Design
//!
//! Parsing runs in stages over a flat token stream:
//!
//! - **Tokenize**: Markdown text to open/close/leaf tokens (`pulldown-cmark`
//!   by default, or any [`Tokenize`] implementation)
//! - **Preprocess**: drop tokenizer bookkeeping the builder must not see
//! - **Build**: assemble the block tree, inline streams become text runs
//!   with marks, links, images and placeholders
//! - **Postprocess**: list numbering, parent tagging, definition lists
//!
//! [`parse`] never fails: any error yields a document holding one empty
//! paragraph. [`try_parse`] surfaces the error instead.
//!
//! ## Example
//!
//! ```rust
//! use slatedown::{parse, serialize, BlockType, Options, ParseOptions};
//!
//! let doc = parse("# Hello\n\nSome **bold** text.", &ParseOptions::default());
//! assert_eq!(doc.nodes[0].block_type, BlockType::Heading1);
//!
//! let markdown = serialize(&doc, &Options::default());
//! assert_eq!(markdown, "# Hello\n\nSome **bold** text.");
//! ```

mod builder;
mod inline;
mod options;
mod parser;
mod postprocess;
mod preprocess;
mod service;
pub mod token;
mod tokenizer;

pub use builder::build_blocks;
pub use inline::build_inlines;
pub use options::{ParseOptions, PlaceholderRule};
pub use parser::{build_document, parse, parse_with, try_parse};
pub use postprocess::postprocess;
pub use preprocess::preprocess;
pub use service::MarkdownService;
pub use token::{Nesting, Token, TokenKind, Tokenize};
pub use tokenizer::MarkdownTokenizer;

pub use slatedown_core::{
    serialize, serialize_with_rules, BlockData, BlockNode, BlockType, Document, Filter,
    InlineNode, InlineType, Kind, Mark, MarkType, Node, Options, RenderContext, Rule, Rules,
    Subject, TextBlock, TextNode,
};

/// Error raised while turning text into tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("Invalid placeholder pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Tokenizer failure: {0}")]
    Failed(String),
}

/// Error raised while assembling the block tree
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Inline content at token {index} has no open block")]
    UnexpectedInline { index: usize },

    #[error("Close token `{tag}` at token {index} has no open block")]
    UnbalancedClose { tag: String, index: usize },

    #[error("{0} block(s) left open at end of stream")]
    UnclosedBlocks(usize),
}

/// Error type for parse operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
