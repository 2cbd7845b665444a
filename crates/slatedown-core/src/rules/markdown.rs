//! Built-in Markdown rendering rules.
//!
//! Order matters: block rules, then inline rules, then mark rules, then the
//! leaf text rule.

use super::rule::{Filter, Kind, Rule, Subject};
use crate::ast::{BlockNode, BlockType, InlineNode, InlineType};
use crate::marks::MarkType;

/// Get all built-in rules
pub fn markdown_rules() -> Vec<Rule> {
    vec![
        heading_rule(),
        paragraph_rule(),
        horizontal_rule_rule(),
        code_block_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        table_rule(),
        table_section_rule(),
        table_row_rule(),
        table_cell_rule(),
        definition_list_rule(),
        definition_term_rule(),
        definition_simple_rule(),
        definition_description_rule(),
        footnote_definition_rule(),
        void_rule(),
        link_rule(),
        image_rule(),
        abbreviation_rule(),
        placeholder_rule(),
        soft_break_rule(),
        emoji_rule(),
        mark_rule(),
        text_rule(),
    ]
}

fn block<'a>(subject: &Subject<'a>) -> Option<&'a BlockNode> {
    match *subject {
        Subject::Block(block) => Some(block),
        _ => None,
    }
}

fn inline<'a>(subject: &Subject<'a>) -> Option<&'a InlineNode> {
    match *subject {
        Subject::Inline(inline) => Some(inline),
        _ => None,
    }
}

/// Prefix every non-empty line with `indent` spaces
fn indent_lines(text: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn heading_rule() -> Rule {
    Rule::for_blocks(
        &[
            BlockType::Heading1,
            BlockType::Heading2,
            BlockType::Heading3,
            BlockType::Heading4,
            BlockType::Heading5,
            BlockType::Heading6,
        ],
        |subject, content, _| {
            let level = block(subject)?.block_type.heading_level()?;
            Some(format!("{} {}", "#".repeat(level), content))
        },
    )
}

fn paragraph_rule() -> Rule {
    Rule::for_block(BlockType::Paragraph, |_, content, _| Some(format!("{content}\n")))
}

fn horizontal_rule_rule() -> Rule {
    Rule::for_block(BlockType::HorizontalRule, |subject, _, ctx| {
        let rule = block(subject)?
            .data
            .markup
            .clone()
            .unwrap_or_else(|| ctx.options.hr.clone());
        Some(rule)
    })
}

fn code_block_rule() -> Rule {
    Rule::for_block(BlockType::Code, |subject, content, ctx| {
        let node = block(subject)?;
        let fence = node.data.markup.as_deref().unwrap_or(&ctx.options.fence);
        let info = node.data.attrs.get("info").map_or("", String::as_str);
        let code = format!("{fence}{info}\n{content}\n{fence}\n");
        if ctx.container == Some(BlockType::ListItem) {
            // own lines, inside the item's content column
            return Some(format!("\n{}", indent_lines(&code, ctx.options.list_indent)));
        }
        Some(code)
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_block(BlockType::Blockquote, |_, content, _| {
        let quoted = content
            .split('\n')
            .map(|line| format!("> {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("\n{quoted}"))
    })
}

fn list_rule() -> Rule {
    Rule::for_blocks(
        &[BlockType::OrderedList, BlockType::UnorderedList],
        |_, content, ctx| {
            let nested = ctx.container == Some(BlockType::ListItem);

            let mut children = content.replace("\n\n", "\n");
            if nested {
                children = indent_lines(&children, ctx.options.list_indent);
            }
            let children = children.replace("\n\n", "\n");
            Some(format!("\n{children}"))
        },
    )
}

fn list_item_rule() -> Rule {
    Rule::for_block(BlockType::ListItem, |subject, content, ctx| {
        let node = block(subject)?;
        let ordered = match node.data.parent {
            Some(parent) => parent == BlockType::OrderedList,
            None => node.data.item_num.is_some(),
        };

        if ordered {
            let num = node.data.item_num.unwrap_or(1);
            let delimiter = node.data.markup.as_deref().unwrap_or(".");
            return Some(format!("{num}{delimiter} {content}\n"));
        }

        let bullet = match &node.data.markup {
            Some(markup) => markup.clone(),
            None => ctx
                .options
                .bullet_for_level(node.data.level.unwrap_or(ctx.depth))
                .to_string(),
        };
        Some(format!("{bullet} {content}\n"))
    })
}

fn table_rule() -> Rule {
    Rule::for_block(BlockType::Table, |_, content, _| Some(content.to_string()))
}

fn table_section_rule() -> Rule {
    Rule::for_blocks(&[BlockType::Thead, BlockType::Tbody], |subject, content, _| {
        let node = block(subject)?;
        if node.block_type == BlockType::Tbody {
            return Some(format!("\n{content}"));
        }

        let columns = node.child_blocks().next().map_or(0, |row| row.nodes.len());
        Some(format!("{content}|{}", " --------- |".repeat(columns)))
    })
}

fn table_row_rule() -> Rule {
    Rule::for_block(BlockType::Tr, |_, content, _| Some(format!("| {content}\n")))
}

fn table_cell_rule() -> Rule {
    Rule::for_blocks(&[BlockType::Th, BlockType::Td], |_, content, _| {
        Some(format!("{content} |"))
    })
}

fn definition_list_rule() -> Rule {
    Rule::for_blocks(&[BlockType::Dl, BlockType::DlSimple], |_, content, _| {
        Some(content.to_string())
    })
}

fn definition_term_rule() -> Rule {
    Rule::for_blocks(&[BlockType::Dt, BlockType::DtSimple], |_, content, _| {
        Some(format!("{content}\n"))
    })
}

fn definition_simple_rule() -> Rule {
    Rule::for_block(BlockType::DdSimple, |_, content, _| {
        Some(format!("  ~ {content}\n"))
    })
}

fn definition_description_rule() -> Rule {
    Rule::for_block(BlockType::Dd, |_, content, _| {
        let lines = content
            .split('\n')
            .enumerate()
            .map(|(i, line)| match (i, line.is_empty()) {
                (_, true) => String::new(),
                (0, false) => format!(":    {line}"),
                (_, false) => format!("     {line}"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("{lines}\n"))
    })
}

fn footnote_definition_rule() -> Rule {
    Rule::for_block(BlockType::Anchor, |subject, content, _| {
        let label = block(subject)?.data.label.as_deref().unwrap_or_default();
        Some(format!("[^{label}]: {content}"))
    })
}

fn void_rule() -> Rule {
    Rule::for_blocks(&[BlockType::Empty, BlockType::AbbrDef], |_, _, _| {
        Some(String::new())
    })
}

fn link_rule() -> Rule {
    Rule::new(Filter::inline(InlineType::Link), |subject, content, _| {
        let InlineNode::Link { href, title, .. } = inline(subject)? else {
            return None;
        };
        match title {
            Some(title) if !title.is_empty() => Some(format!("[{content}]({href} \"{title}\")")),
            _ => Some(format!("[{content}]({href})")),
        }
    })
}

fn image_rule() -> Rule {
    Rule::new(Filter::inline(InlineType::Image), |subject, _, _| {
        let InlineNode::Image { title, src, alt } = inline(subject)? else {
            return None;
        };
        match alt {
            Some(alt) => Some(format!("![{title}]({src} \"{alt}\")")),
            None => Some(format!("![{title}]({src})")),
        }
    })
}

/// Emit the label only; the definition line is written after the enclosing
/// top-level block.
fn abbreviation_rule() -> Rule {
    Rule::new(Filter::inline(InlineType::Abbr), |subject, content, ctx| {
        let InlineNode::Abbr { title, .. } = inline(subject)? else {
            return None;
        };
        ctx.abbreviations.register(content, title);
        Some(content.to_string())
    })
}

fn placeholder_rule() -> Rule {
    Rule::new(
        Filter::inline(InlineType::AutocompletePlaceholder),
        |_, content, _| Some(content.to_string()),
    )
}

fn soft_break_rule() -> Rule {
    Rule::new(Filter::inline(InlineType::SoftBreak), |_, _, _| {
        Some("\n".to_string())
    })
}

fn emoji_rule() -> Rule {
    Rule::new(Filter::mark(MarkType::Emoji), |subject, _, _| match *subject {
        Subject::Mark(mark) => Some(format!(":{}:", mark.markup())),
        _ => None,
    })
}

fn mark_rule() -> Rule {
    Rule::new(Filter::Kind(Kind::Mark), |subject, content, _| match *subject {
        Subject::Mark(mark) => {
            let delimiter = mark.delimiter();
            Some(format!("{delimiter}{content}{delimiter}"))
        }
        _ => None,
    })
}

fn text_rule() -> Rule {
    Rule::new(Filter::Kind(Kind::Text), |_, content, _| Some(content.to_string()))
}
