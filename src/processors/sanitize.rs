//! Input cleanup applied before validation

use regex::Regex;
use std::sync::OnceLock;

/// Hard cap applied while sanitising, before length validation
pub const SANITIZE_MAX_CHARS: usize = 10_000;

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strip HTML tags, collapse whitespace runs and cap the length
pub fn sanitize_question(text: &str) -> String {
    let stripped = tag_pattern().replace_all(text, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(SANITIZE_MAX_CHARS).collect()
}
