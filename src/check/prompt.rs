//! Prompt construction
//!
//! Every backend is asked to answer in the same four-section layout so the
//! report parser can read any of them.

use super::backends::SearchHit;
use super::types::CheckRequest;
use std::fmt::Write;

/// Instructions shared by all chat backends
pub const SYSTEM_PROMPT: &str = "You are a meticulous, neutral fact checker. \
Assess the credibility of the user's selected text using reliable, citable sources. \
Answer with exactly these four sections, in this order, separated by one blank line:\n\
\n\
Sources:\n\
1. [Title of first source](https://first.example)\n\
2. [Title of second source](https://second.example)\n\
\n\
Truth: <a whole-number percentage from 0% to 100%>\n\
\n\
Fact Check: <a short verdict citing sources inline as [1] or [1, 2]>\n\
\n\
Context: <background that helps a reader judge the claim, with inline citations>\n\
\n\
Do not add any other sections, headings or closing remarks.";

/// User prompt for a direct fact-check
pub fn fact_check_prompt(request: &CheckRequest) -> String {
    let mut prompt = format!("Fact-check this text:\n\"{}\"\n", request.selection.trim());

    if !request.page_url.trim().is_empty() {
        let _ = write!(prompt, "\nIt appears on the page: {}\n", request.page_url.trim());
    }
    if !request.page_context.trim().is_empty() {
        let _ = write!(
            prompt,
            "\nSurrounding page text, for context only:\n\"\"\"\n{}\n\"\"\"\n",
            request.page_context.trim()
        );
    }

    prompt
}

/// User prompt for the synthesis step, listing search hits as candidate sources
pub fn synthesis_prompt(request: &CheckRequest, hits: &[SearchHit]) -> String {
    let mut prompt = fact_check_prompt(request);
    prompt.push_str("\nWeb search results you may cite, numbered as candidate sources:\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(prompt, "{}. [{}]({})", i + 1, hit.title, hit.link);
        if !hit.snippet.trim().is_empty() {
            let _ = write!(prompt, " - {}", hit.snippet.trim());
        }
        prompt.push('\n');
    }
    prompt.push_str("\nOnly list sources you actually rely on, keeping their titles and URLs.\n");
    prompt
}

/// Cut text to at most `max_chars` characters, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
