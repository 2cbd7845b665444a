//! Block tree assembly from a preprocessed token stream.

use slatedown_core::{BlockNode, BlockType, InlineNode, Node, TextNode};

use crate::inline::build_inlines;
use crate::token::{Nesting, Token, TokenKind};
use crate::BuildError;

/// Build the block forest for a token stream.
///
/// Open tokens push a block, close tokens pop it into its parent (or the
/// forest when nothing is open). An inline token right after a blank-line
/// marker is dropped.
pub fn build_blocks(tokens: &[Token]) -> Result<Vec<BlockNode>, BuildError> {
    let mut forest = Vec::new();
    let mut stack: Vec<BlockNode> = Vec::new();
    let mut previous: Option<&TokenKind> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token.nesting {
            Nesting::Open => stack.push(block_for(token)),
            Nesting::Close => {
                let block = stack.pop().ok_or_else(|| BuildError::UnbalancedClose {
                    tag: token.tag.clone(),
                    index,
                })?;
                attach(&mut stack, &mut forest, block);
            }
            Nesting::Leaf => match token.kind {
                TokenKind::Inline => {
                    if previous != Some(&TokenKind::EmptyLine) {
                        let current = stack
                            .last_mut()
                            .ok_or(BuildError::UnexpectedInline { index })?;
                        add_inline(current, token);
                    }
                }
                TokenKind::Fence | TokenKind::CodeBlock => {
                    let mut code = block_for(token);
                    code.nodes
                        .push(Node::Text(TextNode::from_text(&token.content)));
                    attach(&mut stack, &mut forest, code);
                }
                TokenKind::HorizontalRule
                | TokenKind::EmptyLine
                | TokenKind::AbbreviationDefinition => {
                    attach(&mut stack, &mut forest, block_for(token));
                }
                _ => log::trace!("skipping stray {:?} token at {index}", token.kind),
            },
        }
        previous = Some(&token.kind);
    }

    if !stack.is_empty() {
        return Err(BuildError::UnclosedBlocks(stack.len()));
    }
    Ok(forest)
}

fn attach(stack: &mut [BlockNode], forest: &mut Vec<BlockNode>, block: BlockNode) {
    match stack.last_mut() {
        Some(parent) => parent.nodes.push(Node::Block(block)),
        None => forest.push(block),
    }
}

fn add_inline(current: &mut BlockNode, token: &Token) {
    let nodes = build_inlines(&token.children);

    // descriptions and quotes hold each line group as its own paragraph
    if matches!(current.block_type, BlockType::Dd | BlockType::Blockquote) {
        let mut paragraph = BlockNode::with_nodes(BlockType::Paragraph, nodes);
        paragraph.data.level = Some(token.level);
        current.nodes.push(Node::Block(paragraph));
        return;
    }

    if nodes.is_empty() {
        return;
    }
    if !current.nodes.is_empty() {
        current.nodes.push(Node::Inline(InlineNode::SoftBreak));
    }
    current.nodes.extend(nodes);
}

/// A block carrying the token's level, attributes and metadata
fn block_for(token: &Token) -> BlockNode {
    let mut block = BlockNode::new(BlockType::from_tag(&token.tag));
    let data = &mut block.data;

    data.level = Some(token.level);
    let keeps_markup = matches!(
        token.kind,
        TokenKind::ListItem | TokenKind::HorizontalRule | TokenKind::Fence
    );
    if keeps_markup && !token.markup.is_empty() {
        data.markup = Some(token.markup.clone());
    }
    for (name, value) in &token.attrs {
        data.attrs.insert(name.clone(), value.clone());
    }
    for (name, value) in &token.meta {
        if name == "label" {
            data.label = Some(value.clone());
        } else {
            data.attrs.insert(name.clone(), value.clone());
        }
    }

    block
}
