//! Keyword ranking of document paragraphs against the question

/// Number of excerpts quoted in the prompt
pub const DEFAULT_TOP_K: usize = 2;

/// Longest excerpt quoted, in characters
const MAX_EXCERPT_CHARS: usize = 400;

/// Lines of `document` that best match the words of `question`.
///
/// Scoring counts case-insensitive occurrences of question words of three or
/// more characters. Ties keep document order; zero scores are dropped.
pub fn rank_excerpts(document: &str, question: &str, top_k: usize) -> Vec<String> {
    let terms: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, usize, &str)> = document
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .filter_map(|(idx, paragraph)| {
            let lower = paragraph.to_lowercase();
            let score: usize = terms.iter().map(|t| lower.matches(t.as_str()).count()).sum();
            (score > 0).then_some((score, idx, paragraph))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(top_k)
        .map(|(_, _, p)| clip(p))
        .collect()
}

fn clip(paragraph: &str) -> String {
    if paragraph.chars().count() <= MAX_EXCERPT_CHARS {
        paragraph.to_string()
    } else {
        let mut clipped: String = paragraph.chars().take(MAX_EXCERPT_CHARS).collect();
        clipped.push_str("...");
        clipped
    }
}
