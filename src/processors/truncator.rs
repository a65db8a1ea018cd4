//! Size ceiling for oversized documents that keeps the informative parts

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Inserted wherever content was dropped
pub const OMISSION_MARKER: &str = "\n\n[content omitted]\n\n";

/// Words that make a middle line worth keeping
const KEY_TERMS: &str = r"(?i)\b(visa|residence|residency|permit|work|study|family|application|deadline|expir\w*|signed|signature|date[ds]?|article|section|clause|part(y|ies)|terminat\w*|fee|fine|penalt\w*|must|shall|obligat\w*)\b";

fn key_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(KEY_TERMS).expect("key term pattern is valid"))
}

/// Outcome of a truncation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation<'a> {
    pub text: Cow<'a, str>,
    pub applied: bool,
}

/// Reduces documents to at most `max_chars` characters
#[derive(Debug, Clone, Copy)]
pub struct DocumentTruncator {
    max_chars: usize,
}

impl DocumentTruncator {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn truncate<'a>(&self, text: &'a str) -> Truncation<'a> {
        truncate(text, self.max_chars)
    }
}

/// Truncate `text` to at most `max_chars` characters.
///
/// Keeps a head (60%) and a tail (40%) of the budget, plus key middle lines
/// when there is room, separated by [`OMISSION_MARKER`]. Idempotent.
pub fn truncate(text: &str, max_chars: usize) -> Truncation<'_> {
    let total = text.chars().count();
    if total <= max_chars {
        return Truncation {
            text: Cow::Borrowed(text),
            applied: false,
        };
    }

    let marker_len = OMISSION_MARKER.chars().count();
    // Too small to hold head, marker and tail in any useful form
    if max_chars < marker_len * 4 {
        return Truncation {
            text: Cow::Owned(text.chars().take(max_chars).collect()),
            applied: true,
        };
    }

    let budget = max_chars - marker_len;
    let head_len = budget * 3 / 5;
    let tail_len = budget - head_len;
    let head_end = byte_offset(text, head_len);
    let tail_start = byte_offset(text, total - tail_len);

    // Excerpts take up to a fifth of the budget, paid for by head and tail
    let excerpt_budget = (max_chars - 2 * marker_len) / 5;
    let excerpts = key_excerpts(&text[head_end..tail_start], excerpt_budget);

    let out = if excerpts.is_empty() {
        let head = snap_head(&text[..head_end]);
        let tail = snap_tail(&text[tail_start..]);
        [head, OMISSION_MARKER, tail].concat()
    } else {
        let remaining = max_chars - 2 * marker_len - excerpts.chars().count();
        let head_len = remaining * 3 / 5;
        let tail_len = remaining - head_len;
        let head = snap_head(&text[..byte_offset(text, head_len)]);
        let tail = snap_tail(&text[byte_offset(text, total - tail_len)..]);
        [head, OMISSION_MARKER, excerpts.as_str(), OMISSION_MARKER, tail].concat()
    };

    debug_assert!(out.chars().count() <= max_chars);
    Truncation {
        text: Cow::Owned(out),
        applied: true,
    }
}

/// Byte offset of the `n`th character, or the end of the string
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}

/// Trim a head section back to its last whitespace if that loses little
fn snap_head(head: &str) -> &str {
    let min = head.len() - head.len() / 5;
    match head.rfind(char::is_whitespace) {
        Some(idx) if idx >= min => &head[..idx],
        _ => head,
    }
}

/// Advance a tail section past its first whitespace if that loses little
fn snap_tail(tail: &str) -> &str {
    let max = tail.len() / 5;
    match tail.find(char::is_whitespace) {
        Some(idx) if idx <= max => tail[idx..].trim_start(),
        _ => tail,
    }
}

/// Middle lines mentioning key terms, joined with newlines, within `budget` chars
fn key_excerpts(middle: &str, budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    for line in middle.lines().map(str::trim) {
        if line.is_empty() || !key_terms().is_match(line) {
            continue;
        }
        let cost = line.chars().count() + usize::from(!out.is_empty());
        if used + cost > budget {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }

    out
}
