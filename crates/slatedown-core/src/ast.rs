//! Editable document tree
//!
//! This module defines the node types an editing surface manipulates. Every
//! node carries a `kind` discriminant (block, inline or text); marks hang off
//! individual text runs rather than wrapping nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::marks::Mark;

/// A whole document: an ordered forest of top-level blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<BlockNode>,
}

impl Document {
    pub fn new(nodes: Vec<BlockNode>) -> Self {
        Self { nodes }
    }

    /// The minimal editable document: one paragraph holding one empty text run.
    pub fn empty() -> Self {
        let mut paragraph = BlockNode::new(BlockType::Paragraph);
        paragraph.nodes.push(Node::Text(TextNode::from_text("")));
        Self {
            nodes: vec![paragraph],
        }
    }
}

/// Any node that can appear in a block's `nodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Block(BlockNode),
    Inline(InlineNode),
    Text(TextNode),
}

impl Node {
    pub fn as_block(&self) -> Option<&BlockNode> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut BlockNode> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }
}

/// Closed set of block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Blockquote,
    ListItem,
    OrderedList,
    UnorderedList,
    HorizontalRule,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Code,
    Dl,
    Dt,
    Dd,
    DlSimple,
    DtSimple,
    DdSimple,
    /// Footnote definition
    Anchor,
    AbbrDef,
    Empty,
    /// Markup with no dedicated type
    Default,
}

impl BlockType {
    /// Map a markup tag (`h1`, `p`, `ul`, ...) to its block type.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "h1" => BlockType::Heading1,
            "h2" => BlockType::Heading2,
            "h3" => BlockType::Heading3,
            "h4" => BlockType::Heading4,
            "h5" => BlockType::Heading5,
            "h6" => BlockType::Heading6,
            "p" => BlockType::Paragraph,
            "blockquote" => BlockType::Blockquote,
            "li" => BlockType::ListItem,
            "ul" => BlockType::UnorderedList,
            "ol" => BlockType::OrderedList,
            "hr" => BlockType::HorizontalRule,
            "table" => BlockType::Table,
            "thead" => BlockType::Thead,
            "tbody" => BlockType::Tbody,
            "tr" => BlockType::Tr,
            "th" => BlockType::Th,
            "td" => BlockType::Td,
            "code" => BlockType::Code,
            "dl" => BlockType::Dl,
            "dt" => BlockType::Dt,
            "dd" => BlockType::Dd,
            "anchor" => BlockType::Anchor,
            "abbr-def" => BlockType::AbbrDef,
            "empty" => BlockType::Empty,
            _ => BlockType::Default,
        }
    }

    /// Heading depth (1-6), if this is a heading
    pub fn heading_level(self) -> Option<usize> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            BlockType::Heading4 => Some(4),
            BlockType::Heading5 => Some(5),
            BlockType::Heading6 => Some(6),
            _ => None,
        }
    }

    /// Leaf-only types never hold children
    pub fn is_void(self) -> bool {
        matches!(
            self,
            BlockType::HorizontalRule | BlockType::Empty | BlockType::AbbrDef
        )
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::OrderedList | BlockType::UnorderedList)
    }

    /// Types whose descendants are tagged with the nearest table section
    pub fn is_table_section(self) -> bool {
        matches!(self, BlockType::Table | BlockType::Thead | BlockType::Tbody)
    }
}

/// Attribute bag carried by every block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    /// Nesting depth of the source token; 0 for top-level blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,

    /// Type of the nearest structural ancestor (list, blockquote, table section)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BlockType>,

    /// 1-based position inside an ordered list, honoring its start value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_num: Option<u64>,

    /// Literal bullet, fence or rule string used in the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    /// Footnote label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Remaining source attributes (`start`, `style`, `info`, ...)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
}

/// A structural node: heading, paragraph, list, table cell, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    #[serde(rename = "type")]
    pub block_type: BlockType,

    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub data: BlockData,

    #[serde(default)]
    pub is_void: bool,
}

impl BlockNode {
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            nodes: Vec::new(),
            data: BlockData::default(),
            is_void: block_type.is_void(),
        }
    }

    pub fn with_nodes(block_type: BlockType, nodes: Vec<Node>) -> Self {
        let mut block = Self::new(block_type);
        block.nodes = nodes;
        block
    }

    /// Child blocks, skipping inline and text children
    pub fn child_blocks(&self) -> impl Iterator<Item = &BlockNode> {
        self.nodes.iter().filter_map(Node::as_block)
    }

    pub fn child_blocks_mut(&mut self) -> impl Iterator<Item = &mut BlockNode> {
        self.nodes.iter_mut().filter_map(Node::as_block_mut)
    }
}

/// Inline node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InlineType {
    Link,
    Image,
    Abbr,
    #[serde(alias = "autocomplete")]
    AutocompletePlaceholder,
    #[serde(rename = "softbreak")]
    SoftBreak,
}

/// Non-text content embedded in a block's text flow
///
/// On the wire every variant has the block layout: `type`, `isVoid`, a
/// `data` bag and, for labelled nodes, one text node in `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "InlineWire", try_from = "InlineWire")]
pub enum InlineNode {
    Link {
        text: TextNode,
        href: String,
        title: Option<String>,
    },

    Image {
        title: String,
        src: String,
        alt: Option<String>,
    },

    /// Abbreviation reference; `title` is the expansion
    Abbr { text: TextNode, title: String },

    /// Host-defined placeholder such as `$term` or `#product`
    AutocompletePlaceholder { text: TextNode, id: String },

    SoftBreak,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineWire {
    #[serde(rename = "type")]
    inline_type: InlineType,
    #[serde(default)]
    is_void: bool,
    #[serde(default)]
    data: InlineData,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl From<InlineNode> for InlineWire {
    fn from(inline: InlineNode) -> Self {
        let inline_type = inline.inline_type();
        let is_void = inline.is_void();
        let mut data = InlineData::default();
        let text = match inline {
            InlineNode::Link { text, href, title } => {
                data.href = Some(href);
                data.title = title;
                Some(text)
            }
            InlineNode::Image { title, src, alt } => {
                data.title = Some(title);
                data.src = Some(src);
                data.alt = alt;
                None
            }
            InlineNode::Abbr { text, title } => {
                data.title = Some(title);
                Some(text)
            }
            InlineNode::AutocompletePlaceholder { text, id } => {
                data.id = Some(id);
                Some(text)
            }
            InlineNode::SoftBreak => None,
        };
        Self {
            inline_type,
            is_void,
            data,
            nodes: text.map(Node::Text).into_iter().collect(),
        }
    }
}

impl TryFrom<InlineWire> for InlineNode {
    type Error = String;

    fn try_from(wire: InlineWire) -> Result<Self, Self::Error> {
        let InlineWire {
            inline_type,
            data,
            nodes,
            ..
        } = wire;
        let label = || {
            nodes
                .iter()
                .find_map(|node| match node {
                    Node::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .unwrap_or_default()
        };
        let required = |field: Option<String>, name: &str| {
            field.ok_or_else(|| format!("{inline_type:?} node is missing data.{name}"))
        };

        Ok(match inline_type {
            InlineType::Link => InlineNode::Link {
                text: label(),
                href: required(data.href, "href")?,
                title: data.title,
            },
            InlineType::Image => InlineNode::Image {
                title: data.title.unwrap_or_default(),
                src: required(data.src, "src")?,
                alt: data.alt,
            },
            InlineType::Abbr => InlineNode::Abbr {
                text: label(),
                title: data.title.unwrap_or_default(),
            },
            InlineType::AutocompletePlaceholder => InlineNode::AutocompletePlaceholder {
                text: label(),
                id: data.id.unwrap_or_default(),
            },
            InlineType::SoftBreak => InlineNode::SoftBreak,
        })
    }
}

impl InlineNode {
    pub fn inline_type(&self) -> InlineType {
        match self {
            InlineNode::Link { .. } => InlineType::Link,
            InlineNode::Image { .. } => InlineType::Image,
            InlineNode::Abbr { .. } => InlineType::Abbr,
            InlineNode::AutocompletePlaceholder { .. } => InlineType::AutocompletePlaceholder,
            InlineNode::SoftBreak => InlineType::SoftBreak,
        }
    }

    pub fn is_void(&self) -> bool {
        self.text().is_none()
    }

    /// The single label child of links, abbreviations and placeholders
    pub fn text(&self) -> Option<&TextNode> {
        match self {
            InlineNode::Link { text, .. }
            | InlineNode::Abbr { text, .. }
            | InlineNode::AutocompletePlaceholder { text, .. } => Some(text),
            InlineNode::Image { .. } | InlineNode::SoftBreak => None,
        }
    }
}

/// A run of text split into differently marked ranges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub ranges: Vec<TextBlock>,
}

impl TextNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A text node with a single unmarked range
    pub fn from_text(text: &str) -> Self {
        Self {
            ranges: vec![TextBlock::plain(text)],
        }
    }

    pub fn push(&mut self, range: TextBlock) {
        self.ranges.push(range);
    }

    /// Concatenated literal content of all ranges
    pub fn plain_text(&self) -> String {
        self.ranges.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Literal text sharing one exact set of marks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub marks: Vec<Mark>,
}

impl TextBlock {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: &str, marks: Vec<Mark>) -> Self {
        Self {
            text: text.to_string(),
            marks,
        }
    }
}
