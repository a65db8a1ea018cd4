//! Bounded-size text segmentation for providers with per-call limits

/// Default chunk size in characters
pub const DEFAULT_CHUNK_CHARS: usize = 2000;

/// Splits text into chunks of at most `max_chars` characters
#[derive(Debug, Clone, Copy)]
pub struct ChunkSplitter {
    max_chars: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_CHARS)
    }
}

impl ChunkSplitter {
    /// Create a splitter. A zero size is clamped to one character.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split `text` into chunks whose in-order concatenation is exactly `text`.
    ///
    /// The returned iterator is cheap to clone, so the sequence can be
    /// replayed from the start.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            rest: text,
            max_chars: self.max_chars,
        }
    }

    /// Reassemble per-chunk outputs in their original order
    pub fn join<I, S>(parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parts.into_iter().fold(String::new(), |mut acc, part| {
            acc.push_str(part.as_ref());
            acc
        })
    }
}

/// Iterator over the chunks of a text
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let cut = match self.rest.char_indices().nth(self.max_chars) {
            // Remainder fits
            None => self.rest.len(),
            Some((window_end, _)) => {
                let window = &self.rest[..window_end];
                find_break(window).unwrap_or(window_end)
            }
        };

        let (chunk, rest) = self.rest.split_at(cut);
        self.rest = rest;
        Some(chunk)
    }
}

/// Byte offset just past the best break inside `window`, if any.
///
/// Sentence ends in the second half of the window win; otherwise the last
/// whitespace anywhere after the first character.
fn find_break(window: &str) -> Option<usize> {
    let half = window.len() / 2;

    let sentence = window
        .char_indices()
        .rev()
        .take_while(|&(idx, _)| idx >= half)
        .find_map(|(idx, ch)| {
            let prev = window[..idx].chars().next_back();
            let is_break = ch == '\n'
                || (ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?' | ';')));
            is_break.then(|| idx + ch.len_utf8())
        });

    sentence.or_else(|| {
        window
            .char_indices()
            .rev()
            .find(|&(idx, ch)| idx > 0 && ch.is_whitespace())
            .map(|(idx, ch)| idx + ch.len_utf8())
    })
}
