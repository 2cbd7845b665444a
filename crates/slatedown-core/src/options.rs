//! Configuration options for Markdown serialization

/// Bullet characters cycled by list nesting level
pub const DEFAULT_BULLET_MARKERS: [char; 10] = ['+', '+', '-', '-', '*', '*', '-', '+', '-', '*'];

/// Options for Markdown serialization
#[derive(Debug, Clone)]
pub struct Options {
    /// Horizontal rule string, used when a rule carries no recorded markup
    pub hr: String,

    /// Fence string for code blocks, used when a block carries no recorded markup
    pub fence: String,

    /// Bullet for an unordered item at `level % len` when no bullet was recorded
    pub bullet_markers: Vec<char>,

    /// Spaces added in front of every line of a nested list
    pub list_indent: usize,
}

impl Options {
    /// Bullet for an unordered list item at the given nesting level
    pub fn bullet_for_level(&self, level: usize) -> char {
        if self.bullet_markers.is_empty() {
            return DEFAULT_BULLET_MARKERS[level % DEFAULT_BULLET_MARKERS.len()];
        }
        self.bullet_markers[level % self.bullet_markers.len()]
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hr: "---".to_string(),
            fence: "```".to_string(),
            bullet_markers: DEFAULT_BULLET_MARKERS.to_vec(),
            list_indent: 4,
        }
    }
}
