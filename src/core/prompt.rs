//! Prompt assembly for the advisor and for LLM-backed translation

use crate::core::models::Language;

/// Notice attached to every answer shown to users
pub const PRIVACY_NOTICE: &str = "Privacy Notice: Your input may contain sensitive legal \
information. Document contents are not stored after your question is answered.";

/// Longest question excerpt quoted in the prompt
const QUESTION_PROMPT_CHARS: usize = 1000;

/// Cut `text` to `max_chars` characters, marking the cut with `...`
pub fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Context handed to the LLM for one question
#[derive(Debug, Clone, Default)]
pub struct AnswerContext<'a> {
    pub question: &'a str,
    pub document: Option<&'a str>,
    pub excerpts: &'a [String],
}

/// Build the advisor prompt. The answer is requested in `reply_lang`.
pub fn answer_prompt(ctx: &AnswerContext<'_>, reply_lang: Language) -> String {
    let mut prompt = String::from(
        "You are a careful legal aid advisor helping expats understand immigration, \
         residence, employment and housing matters. Answer precisely and in a structured \
         way. When a document is provided, ground the answer in it and cite the relevant \
         parts. If the document was shortened, some content is marked as omitted; do not \
         speculate about omitted content.\n\n",
    );

    prompt.push_str("Question: ");
    prompt.push_str(&clip(ctx.question, QUESTION_PROMPT_CHARS));
    prompt.push_str("\n\n");

    if let Some(document) = ctx.document {
        prompt.push_str("Document:\n\"\"\"\n");
        prompt.push_str(document);
        prompt.push_str("\n\"\"\"\n\n");
    }

    if !ctx.excerpts.is_empty() {
        prompt.push_str("Most relevant excerpts:\n");
        for excerpt in ctx.excerpts {
            prompt.push_str("- ");
            prompt.push_str(excerpt);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Reply only in {}. This is general information, not a substitute for a lawyer.",
        reply_lang.name()
    ));
    prompt
}

/// Build a translation-only prompt for LLM-backed translation
pub fn translation_prompt(text: &str, source: Language, target: Language) -> String {
    format!(
        "Translate the following text from {} to {}. Preserve line breaks, numbering and \
         legal terminology. Output only the translation, without commentary.\n\n{}",
        source.name(),
        target.name(),
        text
    )
}
