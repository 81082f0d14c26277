//! Citation linker
//!
//! Narrative text cites sources with bracketed numeric markers such as `[1]`
//! or `[1, 3]`. The linker rewrites each resolvable index into a reference to
//! the matching source's URL and leaves everything else alone.

use super::Source;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// How a resolved citation is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// `<a href="url" target="_blank">1</a>`
    #[default]
    Html,
    /// `[1](url)`
    Markdown,
}

/// `[n]` or `[n, m, ...]`
fn citation_group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[\s*[0-9]+\s*(?:,\s*[0-9]+\s*)*\]").expect("citation pattern is valid")
    })
}

/// Rewrites citation markers against a source list
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationLinker {
    style: CitationStyle,
}

impl CitationLinker {
    pub fn new(style: CitationStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> CitationStyle {
        self.style
    }

    /// Replace every resolvable citation index in `text` with a link.
    ///
    /// Indices are matched against [`Source::index`] by string equality.
    /// Unresolved indices are kept as plain text; a group with no resolved
    /// index is left untouched.
    pub fn linkify(&self, text: &str, sources: &[Source]) -> String {
        rewrite_groups(text, |indices| {
            let mut resolved_any = false;
            let parts: Vec<String> = indices
                .iter()
                .map(|index| match sources.iter().find(|s| s.index == *index) {
                    Some(source) => {
                        resolved_any = true;
                        self.render(index, &source.url)
                    }
                    None => index.to_string(),
                })
                .collect();

            resolved_any.then(|| format!("[{}]", parts.join(", ")))
        })
    }

    fn render(&self, index: &str, url: &str) -> String {
        match self.style {
            CitationStyle::Html => format!(
                "<a href=\"{}\" target=\"_blank\">{}</a>",
                escape_attribute(url),
                index
            ),
            CitationStyle::Markdown => format!("[{}]({})", index, url),
        }
    }
}

/// [`CitationLinker::linkify`] with the default HTML style
pub fn linkify(text: &str, sources: &[Source]) -> String {
    CitationLinker::default().linkify(text, sources)
}

/// Rewrite citation indices through a label mapping.
///
/// Indices without an entry in `mapping` are kept. Groups where nothing
/// changes are left byte-for-byte intact.
pub fn relabel(text: &str, mapping: &HashMap<String, String>) -> String {
    rewrite_groups(text, |indices| {
        let changed = indices
            .iter()
            .any(|index| mapping.get(*index).is_some_and(|to| to != index));
        if !changed {
            return None;
        }
        let parts: Vec<&str> = indices
            .iter()
            .map(|index| mapping.get(*index).map_or(*index, |to| to.as_str()))
            .collect();
        Some(format!("[{}]", parts.join(", ")))
    })
}

/// Every index cited in `text`, in order of appearance
pub fn cited_indices(text: &str) -> Vec<String> {
    let mut indices = Vec::new();
    rewrite_groups(text, |group| {
        indices.extend(group.iter().map(|index| index.to_string()));
        None
    });
    indices
}

/// Visit each citation group, replacing it when `replace` returns `Some`.
///
/// A group immediately followed by `(` is already a markdown link and is
/// skipped.
fn rewrite_groups<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&[&str]) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for group in citation_group_pattern().find_iter(text) {
        if text[group.end()..].starts_with('(') {
            continue;
        }
        let inner = &text[group.start() + 1..group.end() - 1];
        let indices: Vec<&str> = inner.split(',').map(str::trim).collect();

        if let Some(replacement) = replace(&indices) {
            out.push_str(&text[last..group.start()]);
            out.push_str(&replacement);
            last = group.end();
        }
    }

    out.push_str(&text[last..]);
    out
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
