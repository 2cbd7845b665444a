//! slatedown-core - editable document tree and Markdown serialization
//!
//! This crate provides the document model handed to an editing surface and
//! the rule-driven serializer that turns it back into Markdown. Parsing lives
//! in the `slatedown` crate.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────┐
//! Markdown ──parse───▶ │   Document   │ ──serialize──▶ Markdown
//!                      │ blocks/inline│
//!                      │ text + marks │
//!                      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use slatedown_core::{serialize, BlockNode, BlockType, Document, Node, Options, TextNode};
//!
//! let mut heading = BlockNode::new(BlockType::Heading1);
//! heading.nodes.push(Node::Text(TextNode::from_text("Hello World")));
//!
//! let markdown = serialize(&Document::new(vec![heading]), &Options::default());
//! assert_eq!(markdown, "# Hello World");
//! ```

mod ast;
pub mod escape;
mod marks;
mod options;
pub mod rules;
mod serialize;

pub use ast::{
    BlockData, BlockNode, BlockType, Document, InlineNode, InlineType, Node, TextBlock, TextNode,
};
pub use marks::{Mark, MarkData, MarkType};
pub use options::{Options, DEFAULT_BULLET_MARKERS};
pub use rules::{Filter, Kind, Rule, Rules, Subject};
pub use serialize::{serialize, serialize_with_rules, Abbreviation, Abbreviations, RenderContext};
