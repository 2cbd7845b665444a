//! Structural normalization of a freshly built block forest.
//!
//! - descendants of lists, blockquotes and table sections record the
//!   container type in `data.parent`; table sections restart the tag
//! - ordered list items get `data.item_num`, counting from the list's
//!   `start` attribute
//! - definition lists whose descriptions each hold a single paragraph (or
//!   nothing) become the `-simple` variants with the paragraph unwrapped

use slatedown_core::{BlockNode, BlockType, Node};

/// Normalize every block in the forest, top-down.
pub fn postprocess(blocks: &mut [BlockNode]) {
    for block in blocks {
        normalize(block);
    }
}

fn normalize(block: &mut BlockNode) {
    let block_type = block.block_type;
    match block_type {
        BlockType::Table | BlockType::Thead | BlockType::Tbody => {
            tag_descendants(block, block_type);
        }
        BlockType::OrderedList => {
            tag_descendants(block, block_type);
            number_items(block);
        }
        BlockType::UnorderedList | BlockType::Blockquote => {
            tag_descendants(block, block_type);
        }
        BlockType::Dl => simplify_definition_list(block),
        _ => {}
    }

    // nested containers re-tag their own subtree
    for child in block.child_blocks_mut() {
        normalize(child);
    }
}

fn tag_descendants(block: &mut BlockNode, parent: BlockType) {
    for child in block.child_blocks_mut() {
        child.data.parent = Some(parent);
        let inherited = if child.block_type.is_table_section() {
            child.block_type
        } else {
            parent
        };
        tag_descendants(child, inherited);
    }
}

fn number_items(list: &mut BlockNode) {
    let start = list
        .data
        .attrs
        .get("start")
        .and_then(|start| start.trim().parse::<u64>().ok())
        .unwrap_or(1);
    for (item, num) in list.child_blocks_mut().zip(start..) {
        item.data.item_num = Some(num);
    }
}

fn simplify_definition_list(list: &mut BlockNode) {
    let simple = list
        .child_blocks()
        .filter(|child| child.block_type == BlockType::Dd)
        .all(|dd| match &dd.nodes[..] {
            [] => true,
            [Node::Block(only)] => only.block_type == BlockType::Paragraph,
            _ => false,
        });
    if !simple {
        return;
    }

    list.block_type = BlockType::DlSimple;
    for child in list.child_blocks_mut() {
        match child.block_type {
            BlockType::Dt => child.block_type = BlockType::DtSimple,
            BlockType::Dd => {
                child.block_type = BlockType::DdSimple;
                unwrap_paragraph(child);
            }
            _ => {}
        }
    }
}

/// Replace a description's single paragraph with the paragraph's children
fn unwrap_paragraph(description: &mut BlockNode) {
    if let Some(Node::Block(paragraph)) = description.nodes.pop() {
        description.nodes = paragraph.nodes;
    }
}
