//! Leaf text escaping
//!
//! Text runs are escaped before their marks are applied so that literal
//! characters are not read back as block or inline markup.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading heading, blockquote, bullet or ordinal marker followed by a space
/// or the end of the text
static LEADING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^( *)(#+|(?:> *)*>|[+*-]|[0-9]+[.)]|[a-zA-Z][.)])( |$)")
        .expect("leading marker pattern is valid")
});

/// Delimiters that escape when they wrap a run, longest alternative first
const BALANCED_DELIMITERS: &[&str] = &["++", "+", "--", "-", "**", "*", "`", "~~", "~", "^", "=="];

/// Typographic characters and their ASCII spellings
const TYPOGRAPHY: &[(char, &str)] = &[
    ('©', "(C)"),
    ('®', "(R)"),
    ('™', "(TM)"),
    ('§', "(P)"),
    ('±', "+-"),
    ('–', "--"),
    ('—', "---"),
    ('…', "..."),
];

/// Escape a leaf text run.
pub fn escape_text(text: &str) -> String {
    let text = escape_leading_marker(text);
    let text = escape_balanced(&text);
    replace_typography(&text)
}

/// Backslash-escape a leading block marker.
///
/// Headings, blockquotes and bullets get the backslash before the marker,
/// ordinals before their `.` or `)`.
pub fn escape_leading_marker(text: &str) -> String {
    let Some(caps) = LEADING_MARKER.captures(text) else {
        return text.to_string();
    };
    let (Some(indent), Some(marker)) = (caps.get(1), caps.get(2)) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len() + 1);
    out.push_str(indent.as_str());
    let marker = marker.as_str();
    if marker.ends_with(['.', ')']) && marker.len() > 1 {
        let (ordinal, punct) = marker.split_at(marker.len() - 1);
        out.push_str(ordinal);
        out.push('\\');
        out.push_str(punct);
    } else {
        out.push('\\');
        out.push_str(marker);
    }
    out.push_str(&text[indent.len() + marker.len()..]);
    out
}

/// Escape every run fully wrapped by a pair of the same delimiter.
///
/// At each position the first delimiter that starts there is paired with its
/// last occurrence on the same line, at least one character further on.
/// Both occurrences get a backslash; scanning resumes after the closer.
pub fn escape_balanced(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        if let Some(escaped) = rest.strip_prefix('\\') {
            out.push('\\');
            if let Some(c) = escaped.chars().next() {
                out.push(c);
                pos += 1 + c.len_utf8();
            } else {
                pos += 1;
            }
            continue;
        }

        if let Some((delimiter, close)) = find_balanced(rest) {
            out.push('\\');
            out.push_str(delimiter);
            out.push_str(&rest[delimiter.len()..close]);
            out.push('\\');
            out.push_str(delimiter);
            pos += close + delimiter.len();
            continue;
        }

        if let Some(c) = rest.chars().next() {
            out.push(c);
            pos += c.len_utf8();
        }
    }

    out
}

/// First delimiter opening at the start of `rest` that has a closer; returns
/// the delimiter and the closer's byte offset within `rest`.
fn find_balanced(rest: &str) -> Option<(&'static str, usize)> {
    let line_end = rest.find(['\n', '\r']).unwrap_or(rest.len());

    for delimiter in BALANCED_DELIMITERS {
        if !rest.starts_with(delimiter) {
            continue;
        }
        let inner_start = delimiter.len();
        let Some(first) = rest[inner_start..line_end].chars().next() else {
            continue;
        };
        let search_from = inner_start + first.len_utf8();
        if search_from > line_end {
            continue;
        }
        if let Some(offset) = rest[search_from..line_end].rfind(delimiter) {
            return Some((delimiter, search_from + offset));
        }
    }

    None
}

/// Replace typographic characters with their ASCII spelling.
pub fn replace_typography(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match TYPOGRAPHY.iter().find(|(glyph, _)| *glyph == c) {
            Some((_, ascii)) => out.push_str(ascii),
            None => out.push(c),
        }
    }
    out
}
