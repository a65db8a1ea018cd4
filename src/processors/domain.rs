//! Immigration-domain hints drawn from the document

use regex::Regex;
use std::sync::OnceLock;

/// Terms that mark a document as visa or residence related
pub const VISA_KEYWORDS: [&str; 8] = [
    "visa",
    "residence",
    "permit",
    "work",
    "study",
    "family",
    "application",
    "document",
];

fn visa_terms() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"(?i)\b({})", VISA_KEYWORDS.join("|"));
        Regex::new(&pattern).expect("visa keyword pattern is valid")
    })
}

/// Keywords found in `text`, in `VISA_KEYWORDS` order, each at most once.
/// A keyword matches at the start of a word, so "permits" and "working"
/// count but "network" does not.
pub fn visa_keywords(text: &str) -> Vec<&'static str> {
    let mut found = [false; VISA_KEYWORDS.len()];
    for m in visa_terms().find_iter(text) {
        let word = m.as_str().to_lowercase();
        if let Some(i) = VISA_KEYWORDS.iter().position(|k| *k == word) {
            found[i] = true;
        }
    }
    VISA_KEYWORDS
        .iter()
        .zip(found)
        .filter_map(|(k, hit)| hit.then_some(*k))
        .collect()
}

/// Note appended to answers about visa-related documents
pub fn visa_context_note(text: &str) -> Option<String> {
    let keywords = visa_keywords(text);
    if keywords.is_empty() {
        return None;
    }
    Some(format!(
        "(Detected visa-related context: {})",
        keywords.join(", ")
    ))
}
