//! Document serialization
//!
//! Walks the document post-order: children are rendered first, then the
//! first matching rule renders the node around them.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::ast::{BlockNode, BlockType, Document, InlineNode, Node, TextBlock, TextNode};
use crate::escape::escape_text;
use crate::marks::MarkType;
use crate::options::Options;
use crate::rules::{Rules, Subject};

static DEFAULT_RULES: Lazy<Rules> = Lazy::new(Rules::new);

/// One registered abbreviation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    pub title: String,
    /// Whether its definition line has been written
    pub used: bool,
}

/// Abbreviations seen during one serialize call, keyed by rendered label
#[derive(Debug, Clone, Default)]
pub struct Abbreviations {
    entries: IndexMap<String, Abbreviation>,
    has_new: bool,
}

impl Abbreviations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label on first sight; later registrations are ignored.
    pub fn register(&mut self, label: &str, title: &str) {
        if self.entries.contains_key(label) {
            return;
        }
        self.entries.insert(
            label.to_string(),
            Abbreviation {
                title: title.to_string(),
                used: false,
            },
        );
        self.has_new = true;
    }

    /// Whether a label was registered since the last `take_unused`
    pub fn has_new(&self) -> bool {
        self.has_new
    }

    pub fn get(&self, label: &str) -> Option<&Abbreviation> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unwritten `(label, title)` pairs in registration order; marks them used.
    pub fn take_unused(&mut self) -> Vec<(String, String)> {
        self.has_new = false;
        self.entries
            .iter_mut()
            .filter(|(_, abbr)| !abbr.used)
            .map(|(label, abbr)| {
                abbr.used = true;
                (label.clone(), abbr.title.clone())
            })
            .collect()
    }
}

/// State owned by a single serialize call
pub struct RenderContext<'a> {
    pub options: &'a Options,
    pub abbreviations: Abbreviations,
    /// Block nesting depth of the node being rendered; 0 at the top
    pub depth: usize,
    /// Type of the block enclosing the node being rendered
    pub container: Option<BlockType>,
}

impl<'a> RenderContext<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self {
            options,
            abbreviations: Abbreviations::new(),
            depth: 0,
            container: None,
        }
    }
}

/// Serialize a document to Markdown with the built-in rules
pub fn serialize(document: &Document, options: &Options) -> String {
    serialize_with_rules(document, &DEFAULT_RULES, options)
}

/// Serialize a document to Markdown with a custom rule set
pub fn serialize_with_rules(document: &Document, rules: &Rules, options: &Options) -> String {
    let mut ctx = RenderContext::new(options);
    let blocks: Vec<String> = document
        .nodes
        .iter()
        .map(|block| render_block(block, rules, &mut ctx))
        .collect();

    blocks.join("\n").trim().to_string()
}

fn render_node(node: &Node, verbatim: bool, rules: &Rules, ctx: &mut RenderContext<'_>) -> String {
    match node {
        Node::Block(block) => render_block(block, rules, ctx),
        Node::Inline(inline) => render_inline(inline, rules, ctx),
        Node::Text(text) => render_text(text, verbatim, rules, ctx),
    }
}

fn render_block(block: &BlockNode, rules: &Rules, ctx: &mut RenderContext<'_>) -> String {
    let depth = ctx.depth;
    let verbatim = block.block_type == BlockType::Code;

    ctx.depth += 1;
    let container = ctx.container.replace(block.block_type);
    let mut children = String::new();
    for node in &block.nodes {
        children.push_str(&render_node(node, verbatim, rules, ctx));
    }
    ctx.container = container;
    ctx.depth = depth;

    let mut out = rules
        .apply(&Subject::Block(block), &children, ctx)
        .unwrap_or(children);

    let top_level = block.data.level.map_or(depth == 0, |level| level == 0);
    if top_level && !out.is_empty() && ctx.abbreviations.has_new() {
        append_abbreviations(&mut out, ctx);
    }

    out
}

/// Write `*[label]: title` for every abbreviation not yet defined, keeping the
/// block's trailing line break where it was.
fn append_abbreviations(out: &mut String, ctx: &mut RenderContext<'_>) {
    for (label, title) in ctx.abbreviations.take_unused() {
        if out.ends_with('\n') {
            out.push_str(&format!("*[{label}]: {title}\n"));
        } else {
            out.push_str(&format!("\n*[{label}]: {title}"));
        }
    }
}

fn render_inline(inline: &InlineNode, rules: &Rules, ctx: &mut RenderContext<'_>) -> String {
    let children = match inline.text() {
        Some(text) => render_text(text, false, rules, ctx),
        None => String::new(),
    };
    rules
        .apply(&Subject::Inline(inline), &children, ctx)
        .unwrap_or(children)
}

fn render_text(text: &TextNode, verbatim: bool, rules: &Rules, ctx: &mut RenderContext<'_>) -> String {
    render_runs(&text.ranges, 0, verbatim, rules, ctx)
}

/// Wrap consecutive runs sharing the mark at position `skip` once, so
/// `**bold _it_**` keeps a single pair of outer delimiters.
fn render_runs(
    ranges: &[TextBlock],
    skip: usize,
    verbatim: bool,
    rules: &Rules,
    ctx: &mut RenderContext<'_>,
) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < ranges.len() {
        let Some(mark) = ranges[i].marks.get(skip) else {
            out.push_str(&render_leaf(&ranges[i], verbatim, rules, ctx));
            i += 1;
            continue;
        };

        // code spans and emoji render their own content
        let end = if matches!(mark.mark_type, MarkType::Code | MarkType::Emoji) {
            i + 1
        } else {
            i + ranges[i..]
                .iter()
                .take_while(|range| range.marks.get(skip) == Some(mark))
                .count()
        };

        let inner = render_runs(&ranges[i..end], skip + 1, verbatim, rules, ctx);
        out.push_str(
            &rules
                .apply(&Subject::Mark(mark), &inner, ctx)
                .unwrap_or(inner),
        );
        i = end;
    }
    out
}

/// Escape the text of one run unless it is code or sits in a code block
fn render_leaf(range: &TextBlock, verbatim: bool, rules: &Rules, ctx: &mut RenderContext<'_>) -> String {
    let verbatim = verbatim
        || range
            .marks
            .iter()
            .any(|mark| matches!(mark.mark_type, MarkType::Code | MarkType::Emoji));
    let escaped = if verbatim {
        range.text.clone()
    } else {
        escape_text(&range.text)
    };

    rules
        .apply(&Subject::Text(&range.text), &escaped, ctx)
        .unwrap_or(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::Mark;
    use pretty_assertions::assert_eq;

    fn default_options() -> Options {
        Options::default()
    }

    fn text(s: &str) -> Node {
        Node::Text(TextNode::from_text(s))
    }

    fn top(block_type: BlockType, nodes: Vec<Node>) -> BlockNode {
        let mut block = BlockNode::with_nodes(block_type, nodes);
        block.data.level = Some(0);
        block
    }

    fn doc(blocks: Vec<BlockNode>) -> Document {
        Document::new(blocks)
    }

    #[test]
    fn test_headings() {
        for (level, block_type) in [
            (1, BlockType::Heading1),
            (3, BlockType::Heading3),
            (6, BlockType::Heading6),
        ] {
            let d = doc(vec![top(block_type, vec![text("Title")])]);
            let expected = format!("{} Title", "#".repeat(level));
            assert_eq!(serialize(&d, &default_options()), expected);
        }
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        let d = doc(vec![
            top(BlockType::Paragraph, vec![text("one")]),
            top(BlockType::Paragraph, vec![text("two")]),
        ]);
        assert_eq!(serialize(&d, &default_options()), "one\n\ntwo");
    }

    #[test]
    fn test_marks_keep_recorded_delimiter() {
        let range = TextBlock::marked(
            "strong",
            vec![Mark::from_markup("__").unwrap()],
        );
        let plain = TextBlock::plain(" and ");
        let italic = TextBlock::marked("em", vec![Mark::new(MarkType::Italic, "")]);
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Text(TextNode {
                ranges: vec![range, plain, italic],
            })],
        )]);
        assert_eq!(serialize(&d, &default_options()), "__strong__ and *em*");
    }

    #[test]
    fn test_first_mark_is_outermost() {
        let range = TextBlock::marked(
            "x",
            vec![Mark::new(MarkType::Bold, "**"), Mark::new(MarkType::Italic, "_")],
        );
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Text(TextNode { ranges: vec![range] })],
        )]);
        assert_eq!(serialize(&d, &default_options()), "**_x_**");
    }

    #[test]
    fn test_shared_outer_mark_is_written_once() {
        let bold = Mark::new(MarkType::Bold, "**");
        let ranges = vec![
            TextBlock::marked("bold ", vec![bold.clone()]),
            TextBlock::marked("it", vec![bold.clone(), Mark::new(MarkType::Italic, "_")]),
            TextBlock::plain(" after"),
        ];
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Text(TextNode { ranges })],
        )]);
        assert_eq!(serialize(&d, &default_options()), "**bold _it_** after");
    }

    #[test]
    fn test_adjacent_emoji_are_not_merged() {
        let smile = || TextBlock::marked("", vec![Mark::new(MarkType::Emoji, "smile")]);
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Text(TextNode {
                ranges: vec![smile(), smile()],
            })],
        )]);
        assert_eq!(serialize(&d, &default_options()), ":smile::smile:");
    }

    #[test]
    fn test_code_mark_is_not_escaped() {
        let range = TextBlock::marked("*x*", vec![Mark::from_markup("`").unwrap()]);
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Text(TextNode { ranges: vec![range] })],
        )]);
        assert_eq!(serialize(&d, &default_options()), "`*x*`");
    }

    #[test]
    fn test_code_block_uses_fence() {
        let d = doc(vec![top(BlockType::Code, vec![text("let a = *b*;")])]);
        assert_eq!(serialize(&d, &default_options()), "```\nlet a = *b*;\n```");
    }

    #[test]
    fn test_horizontal_rule() {
        let d = doc(vec![top(BlockType::HorizontalRule, vec![])]);
        assert_eq!(serialize(&d, &default_options()), "---");

        let mut rule = top(BlockType::HorizontalRule, vec![]);
        rule.data.markup = Some("***".to_string());
        assert_eq!(serialize(&doc(vec![rule]), &default_options()), "***");
    }

    #[test]
    fn test_blockquote() {
        let mut inner = BlockNode::with_nodes(BlockType::Paragraph, vec![text("quoted")]);
        inner.data.level = Some(1);
        let d = doc(vec![top(BlockType::Blockquote, vec![Node::Block(inner)])]);
        assert_eq!(serialize(&d, &default_options()), "> quoted\n>");
    }

    #[test]
    fn test_unordered_list_uses_level_bullets() {
        let mut item = BlockNode::with_nodes(BlockType::ListItem, vec![text("a")]);
        item.data.level = Some(1);
        item.data.parent = Some(BlockType::UnorderedList);
        let d = doc(vec![top(
            BlockType::UnorderedList,
            vec![Node::Block(item.clone()), Node::Block(item)],
        )]);
        assert_eq!(serialize(&d, &default_options()), "+ a\n+ a");
    }

    #[test]
    fn test_nested_list_is_indented() {
        let mut sub_item = BlockNode::with_nodes(BlockType::ListItem, vec![text("b")]);
        sub_item.data.level = Some(3);
        sub_item.data.parent = Some(BlockType::UnorderedList);
        let mut sub_list =
            BlockNode::with_nodes(BlockType::UnorderedList, vec![Node::Block(sub_item)]);
        sub_list.data.level = Some(2);

        let mut item =
            BlockNode::with_nodes(BlockType::ListItem, vec![text("a"), Node::Block(sub_list)]);
        item.data.level = Some(1);
        item.data.parent = Some(BlockType::UnorderedList);

        let d = doc(vec![top(BlockType::UnorderedList, vec![Node::Block(item)])]);
        assert_eq!(serialize(&d, &default_options()), "+ a\n    - b");
    }

    fn bullet_item(nodes: Vec<Node>) -> Node {
        let mut item = BlockNode::with_nodes(BlockType::ListItem, nodes);
        item.data.level = Some(1);
        item.data.parent = Some(BlockType::UnorderedList);
        item.data.markup = Some("-".to_string());
        Node::Block(item)
    }

    #[test]
    fn test_list_inside_blockquote_is_not_indented() {
        let mut list = BlockNode::with_nodes(
            BlockType::UnorderedList,
            vec![bullet_item(vec![text("a")]), bullet_item(vec![text("b")])],
        );
        list.data.level = Some(1);
        let d = doc(vec![top(BlockType::Blockquote, vec![Node::Block(list)])]);
        assert_eq!(serialize(&d, &default_options()), "> \n> - a\n> - b\n>");
    }

    #[test]
    fn test_code_block_in_list_item_starts_on_own_line() {
        let code = BlockNode::with_nodes(BlockType::Code, vec![text("let x = 1;")]);
        let d = doc(vec![top(
            BlockType::UnorderedList,
            vec![bullet_item(vec![text("a"), Node::Block(code)])],
        )]);
        assert_eq!(
            serialize(&d, &default_options()),
            "- a\n    ```\n    let x = 1;\n    ```"
        );
    }

    #[test]
    fn test_ordered_items() {
        let items = (3..=4)
            .map(|n| {
                let mut item = BlockNode::with_nodes(BlockType::ListItem, vec![text("x")]);
                item.data.parent = Some(BlockType::OrderedList);
                item.data.item_num = Some(n);
                item.data.level = Some(1);
                Node::Block(item)
            })
            .collect();
        let d = doc(vec![top(BlockType::OrderedList, items)]);
        assert_eq!(serialize(&d, &default_options()), "3. x\n4. x");
    }

    #[test]
    fn test_table() {
        let row = |cell: BlockType, a: &str, b: &str| {
            Node::Block(BlockNode::with_nodes(
                BlockType::Tr,
                vec![
                    Node::Block(BlockNode::with_nodes(cell, vec![text(a)])),
                    Node::Block(BlockNode::with_nodes(cell, vec![text(b)])),
                ],
            ))
        };
        let thead = BlockNode::with_nodes(BlockType::Thead, vec![row(BlockType::Th, "a", "b")]);
        let tbody = BlockNode::with_nodes(BlockType::Tbody, vec![row(BlockType::Td, "1", "2")]);
        let d = doc(vec![top(
            BlockType::Table,
            vec![Node::Block(thead), Node::Block(tbody)],
        )]);
        assert_eq!(
            serialize(&d, &default_options()),
            "| a |b |\n| --------- | --------- |\n| 1 |2 |"
        );
    }

    #[test]
    fn test_links_and_images() {
        let link = InlineNode::Link {
            text: TextNode::from_text("site"),
            href: "https://example.com".to_string(),
            title: None,
        };
        let image = InlineNode::Image {
            title: "logo".to_string(),
            src: "logo.png".to_string(),
            alt: Some("The logo".to_string()),
        };
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Inline(link), text(" "), Node::Inline(image)],
        )]);
        assert_eq!(
            serialize(&d, &default_options()),
            "[site](https://example.com) ![logo](logo.png \"The logo\")"
        );
    }

    #[test]
    fn test_image_without_alt_has_no_title_part() {
        let image = InlineNode::Image {
            title: "logo".to_string(),
            src: "logo.png".to_string(),
            alt: None,
        };
        let d = doc(vec![top(BlockType::Paragraph, vec![Node::Inline(image)])]);
        assert_eq!(serialize(&d, &default_options()), "![logo](logo.png)");
    }

    #[test]
    fn test_full_definition_list_indents_description() {
        let paragraph = |s: &str| Node::Block(BlockNode::with_nodes(BlockType::Paragraph, vec![text(s)]));
        let d = doc(vec![top(
            BlockType::Dl,
            vec![
                Node::Block(BlockNode::with_nodes(BlockType::Dt, vec![text("Term")])),
                Node::Block(BlockNode::with_nodes(
                    BlockType::Dd,
                    vec![paragraph("one"), paragraph("two")],
                )),
            ],
        )]);
        assert_eq!(serialize(&d, &default_options()), "Term\n:    one\n     two");
    }

    #[test]
    fn test_simple_definition_list_entries() {
        let entry = |term: &str, meaning: &str| {
            vec![
                Node::Block(BlockNode::with_nodes(BlockType::DtSimple, vec![text(term)])),
                Node::Block(BlockNode::with_nodes(BlockType::DdSimple, vec![text(meaning)])),
            ]
        };
        let mut nodes = entry("Term", "Meaning");
        nodes.extend(entry("Other", "Def"));
        let d = doc(vec![top(BlockType::DlSimple, nodes)]);
        assert_eq!(
            serialize(&d, &default_options()),
            "Term\n  ~ Meaning\nOther\n  ~ Def"
        );
    }

    #[test]
    fn test_abbreviation_definition_written_once() {
        let abbr = || {
            Node::Inline(InlineNode::Abbr {
                text: TextNode::from_text("HTML"),
                title: "Hyper Text Markup Language".to_string(),
            })
        };
        let d = doc(vec![
            top(BlockType::Paragraph, vec![abbr(), text(" and "), abbr()]),
            top(BlockType::Paragraph, vec![text("more "), abbr()]),
        ]);
        let out = serialize(&d, &default_options());
        assert_eq!(
            out,
            "HTML and HTML\n*[HTML]: Hyper Text Markup Language\n\nmore HTML"
        );
        assert_eq!(out.matches("*[HTML]").count(), 1);
    }

    #[test]
    fn test_abbreviations_reset_between_calls() {
        let d = doc(vec![top(
            BlockType::Paragraph,
            vec![Node::Inline(InlineNode::Abbr {
                text: TextNode::from_text("W3C"),
                title: "World Wide Web Consortium".to_string(),
            })],
        )]);
        let first = serialize(&d, &default_options());
        let second = serialize(&d, &default_options());
        assert_eq!(first, second);
        assert!(second.contains("*[W3C]: World Wide Web Consortium"));
    }

    #[test]
    fn test_escaped_heading_text() {
        let d = doc(vec![top(BlockType::Paragraph, vec![text("# not a heading")])]);
        assert_eq!(serialize(&d, &default_options()), "\\# not a heading");
    }

    #[test]
    fn test_unknown_block_renders_children() {
        let d = doc(vec![top(BlockType::Default, vec![text("plain")])]);
        assert_eq!(serialize(&d, &default_options()), "plain");
    }

    #[test]
    fn test_empty_blocks_keep_blank_lines() {
        let d = doc(vec![
            top(BlockType::Paragraph, vec![text("a")]),
            top(BlockType::Empty, vec![]),
            top(BlockType::Paragraph, vec![text("b")]),
        ]);
        assert_eq!(serialize(&d, &default_options()), "a\n\n\nb");
    }
}
