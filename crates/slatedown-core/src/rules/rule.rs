//! Rule and Filter types for document serialization.

use crate::ast::{BlockNode, BlockType, InlineNode, InlineType};
use crate::marks::{Mark, MarkType};
use crate::serialize::RenderContext;

/// Node category a rule can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Block,
    Inline,
    Mark,
    Text,
}

/// The thing being rendered, handed to filters and replacements
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Block(&'a BlockNode),
    Inline(&'a InlineNode),
    Mark(&'a Mark),
    /// Leaf text, before escaping
    Text(&'a str),
}

impl Subject<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Subject::Block(_) => Kind::Block,
            Subject::Inline(_) => Kind::Inline,
            Subject::Mark(_) => Kind::Mark,
            Subject::Text(_) => Kind::Text,
        }
    }
}

/// Type alias for replacement functions.
///
/// The second argument is the already rendered content (children for blocks
/// and inlines, wrapped text for marks, escaped text for leaves). Returning
/// `None` lets the next rule try.
pub type ReplacementFn =
    Box<dyn Fn(&Subject<'_>, &str, &mut RenderContext<'_>) -> Option<String> + Send + Sync>;

/// A filter determines which nodes a rule applies to
pub enum Filter {
    /// Match every node of a kind
    Kind(Kind),
    /// Match any of the given block types
    Blocks(Vec<BlockType>),
    /// Match any of the given inline types
    Inlines(Vec<InlineType>),
    /// Match any of the given mark types
    Marks(Vec<MarkType>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&Subject<'_>, &RenderContext<'_>) -> bool + Send + Sync>),
}

impl Filter {
    /// Create a filter for a single block type
    pub fn block(block_type: BlockType) -> Self {
        Filter::Blocks(vec![block_type])
    }

    /// Create a filter for multiple block types
    pub fn blocks(types: &[BlockType]) -> Self {
        Filter::Blocks(types.to_vec())
    }

    pub fn inline(inline_type: InlineType) -> Self {
        Filter::Inlines(vec![inline_type])
    }

    pub fn mark(mark_type: MarkType) -> Self {
        Filter::Marks(vec![mark_type])
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Subject<'_>, &RenderContext<'_>) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches a subject
    pub fn matches(&self, subject: &Subject<'_>, ctx: &RenderContext<'_>) -> bool {
        match (self, subject) {
            (Filter::Kind(kind), _) => subject.kind() == *kind,
            (Filter::Blocks(types), Subject::Block(block)) => types.contains(&block.block_type),
            (Filter::Inlines(types), Subject::Inline(inline)) => {
                types.contains(&inline.inline_type())
            }
            (Filter::Marks(types), Subject::Mark(mark)) => types.contains(&mark.mark_type),
            (Filter::Predicate(f), _) => f(subject, ctx),
            _ => false,
        }
    }
}

/// A rule defines how to render a matched node to Markdown
pub struct Rule {
    /// Filter to determine which nodes this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown
    pub replacement: ReplacementFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&Subject<'_>, &str, &mut RenderContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Box::new(replacement),
        }
    }

    /// Create a rule that matches a single block type
    pub fn for_block<F>(block_type: BlockType, replacement: F) -> Self
    where
        F: Fn(&Subject<'_>, &str, &mut RenderContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(Filter::block(block_type), replacement)
    }

    /// Create a rule that matches multiple block types
    pub fn for_blocks<F>(types: &[BlockType], replacement: F) -> Self
    where
        F: Fn(&Subject<'_>, &str, &mut RenderContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(Filter::blocks(types), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        subject: &Subject<'_>,
        content: &str,
        ctx: &mut RenderContext<'_>,
    ) -> Option<String> {
        (self.replacement)(subject, content, ctx)
    }
}
