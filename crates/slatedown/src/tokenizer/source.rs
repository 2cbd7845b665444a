//! Line-level rewriting done before the Markdown parser runs, and blank line
//! counting between top-level blocks.

use once_cell::sync::Lazy;
use regex::Regex;

static ABBREVIATION_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\[([^\]]+)\]:[ \t]*(.*)$").expect("abbreviation pattern is valid")
});

/// A description line written with the `~` marker
static TILDE_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^( {0,3})~([ \t])").expect("description pattern is valid"));

/// A description line with either marker
static DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}[~:][ \t]").expect("description pattern is valid"));

/// Source text ready for the Markdown parser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    pub text: String,
    /// `(label, title)` pairs, in source order
    pub abbreviations: Vec<(String, String)>,
}

/// Strip abbreviation definitions and normalize `~` description markers.
///
/// A term written directly below a description would be read as a lazy
/// continuation of it, so a blank line is put in front of such terms.
/// Fenced code is left untouched.
pub fn prepare(text: &str) -> Prepared {
    let mut prepared = Prepared {
        text: String::with_capacity(text.len()),
        abbreviations: Vec::new(),
    };
    let mut fence: Option<(char, usize)> = None;
    let mut in_description = false;
    let mut after_blank = false;

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    for (i, line) in lines.iter().copied().enumerate() {
        let body = line.trim_end_matches(['\n', '\r']);

        if let Some(open) = fence {
            if closes_fence(body, open) {
                fence = None;
            }
            prepared.text.push_str(line);
            continue;
        }
        if let Some(open) = opens_fence(body) {
            fence = Some(open);
            prepared.text.push_str(line);
            continue;
        }

        if let Some(caps) = ABBREVIATION_DEFINITION.captures(body) {
            let label = caps.get(1).map_or("", |m| m.as_str()).trim();
            let title = caps.get(2).map_or("", |m| m.as_str()).trim();
            if !label.is_empty() && !prepared.abbreviations.iter().any(|(l, _)| l == label) {
                prepared
                    .abbreviations
                    .push((label.to_string(), title.to_string()));
            }
            continue;
        }

        if body.trim().is_empty() {
            after_blank = true;
            prepared.text.push_str(line);
            continue;
        }

        if DESCRIPTION.is_match(body) {
            in_description = true;
        } else if !body.starts_with([' ', '\t']) {
            let next_is_description = lines
                .get(i + 1)
                .is_some_and(|next| DESCRIPTION.is_match(next));
            if in_description && !after_blank && next_is_description {
                prepared.text.push('\n');
            }
            in_description = false;
        }
        after_blank = false;

        if let Some(caps) = TILDE_DESCRIPTION.captures(body) {
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let separator = caps.get(2).map_or(" ", |m| m.as_str());
            prepared.text.push(':');
            prepared.text.push_str(&" ".repeat(indent));
            prepared.text.push_str(separator);
            prepared.text.push_str(&line[indent + 2..]);
            continue;
        }

        prepared.text.push_str(line);
    }

    prepared
}

/// Fence character and length if the line opens a fenced code block
fn opens_fence(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then_some((first, count))
}

fn closes_fence(line: &str, (fence_char, fence_len): (char, usize)) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let count = trimmed.chars().take_while(|&c| c == fence_char).count();
    count >= fence_len && trimmed[count..].trim().is_empty()
}

/// Number of whitespace-only lines between the last content of the block
/// ending at `prev_end` and the line on which `next_start` begins.
pub fn blank_lines_between(source: &str, prev_end: usize, next_start: usize) -> usize {
    let prev_end = prev_end.min(source.len());
    let next_start = next_start.min(source.len());
    if prev_end > next_start {
        return 0;
    }

    // end of the previous block's last non-blank line
    let content_end = source[..prev_end].trim_end().len();
    let Some(newline) = source[content_end..next_start].find('\n') else {
        return 0;
    };
    let gap_start = content_end + newline + 1;
    let gap_end = source[..next_start].rfind('\n').map_or(0, |i| i + 1);
    if gap_start >= gap_end {
        return 0;
    }

    source[gap_start..gap_end]
        .split_inclusive('\n')
        .filter(|line| line.trim().is_empty())
        .count()
}
