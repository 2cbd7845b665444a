//! Mark table: markup delimiters to semantic style marks

use serde::{Deserialize, Serialize};

/// Closed set of style marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Bold,
    Italic,
    Code,
    Strikethrough,
    Superscript,
    Subscript,
    Insert,
    Highlight,
    Emoji,
}

impl MarkType {
    /// Look up the mark a delimiter stands for.
    ///
    /// Emoji has no delimiter; emoji runs are tagged directly by the inline
    /// builder.
    pub fn from_markup(markup: &str) -> Option<Self> {
        match markup {
            "**" | "__" => Some(MarkType::Bold),
            "*" | "_" => Some(MarkType::Italic),
            "`" => Some(MarkType::Code),
            "~~" => Some(MarkType::Strikethrough),
            "^" => Some(MarkType::Superscript),
            "~" => Some(MarkType::Subscript),
            "++" => Some(MarkType::Insert),
            "==" => Some(MarkType::Highlight),
            _ => None,
        }
    }

    /// Delimiter used when a mark carries no recorded markup
    pub fn canonical_delimiter(self) -> &'static str {
        match self {
            MarkType::Bold => "**",
            MarkType::Italic => "*",
            MarkType::Code => "`",
            MarkType::Strikethrough => "~~",
            MarkType::Superscript => "^",
            MarkType::Subscript => "~",
            MarkType::Insert => "++",
            MarkType::Highlight => "==",
            MarkType::Emoji => ":",
        }
    }
}

/// Literal delimiter carried by a mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkData {
    pub markup: String,
}

/// A style annotation on one text run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: MarkType,
    #[serde(default)]
    pub data: MarkData,
}

impl Mark {
    pub fn new(mark_type: MarkType, markup: &str) -> Self {
        Self {
            mark_type,
            data: MarkData {
                markup: markup.to_string(),
            },
        }
    }

    /// Build a mark from its delimiter, keeping the delimiter as markup.
    pub fn from_markup(markup: &str) -> Option<Self> {
        MarkType::from_markup(markup).map(|mark_type| Self::new(mark_type, markup))
    }

    pub fn markup(&self) -> &str {
        &self.data.markup
    }

    /// Delimiter to emit: the recorded one, else the canonical one
    pub fn delimiter(&self) -> &str {
        if self.data.markup.is_empty() {
            self.mark_type.canonical_delimiter()
        } else {
            &self.data.markup
        }
    }
}
