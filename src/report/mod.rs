//! Fact-check report model
//!
//! A [`FactCheckReport`] is the structured form of one backend's free-text
//! answer, or of several answers merged together. Reports are plain values:
//! the parser builds them, the reconciler builds new ones from old ones, and
//! nothing mutates a report after construction.
//!
//! # Wire convention
//!
//! Backends answer with four blank-line separated sections:
//!
//! ```text
//! Sources:
//! 1. [Title](https://example.com/a)
//! 2. [Other](https://example.com/b)
//!
//! Truth: 80%
//!
//! Fact Check: The claim is mostly accurate [1].
//!
//! Context: Some background [2].
//! ```

pub mod citation;
pub mod parser;

pub use citation::{cited_indices, linkify, relabel, CitationLinker, CitationStyle};
pub use parser::parse;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a narrative or truth field that the backend never produced.
pub const NOT_PROVIDED: &str = "Not provided";

/// Merged truth value when no backend produced a usable percentage.
pub const TRUTH_UNAVAILABLE: &str = "Unavailable";

/// URL of a source whose line carried no `[title](url)` link.
pub const PLACEHOLDER_URL: &str = "#";

/// One cited reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Label as it appeared in the report (`"1"`, `"2"`, ...)
    pub index: String,
    /// Display text
    pub title: String,
    /// Absolute URL, or [`PLACEHOLDER_URL`]
    pub url: String,
}

impl Source {
    pub fn new(index: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            title: title.into(),
            url: url.into(),
        }
    }

    /// Whether the URL is a real link rather than the placeholder
    pub fn has_url(&self) -> bool {
        self.url != PLACEHOLDER_URL
    }
}

/// Structured result of one backend, or the merged result of several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckReport {
    /// Percentage string such as `"80%"`, or a sentinel
    pub truth_percentage: String,
    /// Fact-check narrative
    pub fact_check: String,
    /// Contextual explanation
    pub context: String,
    /// Cited sources, in citation order
    pub sources: Vec<Source>,
}

impl Default for FactCheckReport {
    fn default() -> Self {
        Self {
            truth_percentage: NOT_PROVIDED.to_string(),
            fact_check: NOT_PROVIDED.to_string(),
            context: NOT_PROVIDED.to_string(),
            sources: Vec::new(),
        }
    }
}

impl FactCheckReport {
    pub fn new(
        truth_percentage: impl Into<String>,
        fact_check: impl Into<String>,
        context: impl Into<String>,
        sources: Vec<Source>,
    ) -> Self {
        Self {
            truth_percentage: truth_percentage.into(),
            fact_check: fact_check.into(),
            context: context.into(),
            sources,
        }
    }

    /// Look up a source by its label
    pub fn source(&self, index: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.index == index)
    }

    /// Serialize using the wire convention, suitable for clipboard export.
    ///
    /// Sections always appear in the order `Sources`, `Truth`, `Fact Check`,
    /// `Context`, separated by one blank line.
    pub fn to_plain_text(&self) -> String {
        let mut sources = String::from("Sources:");
        for source in &self.sources {
            sources.push('\n');
            sources.push_str(&format!(
                "{}. [{}]({})",
                source.index, source.title, source.url
            ));
        }

        [
            sources,
            format!("Truth: {}", self.truth_percentage),
            format!("Fact Check: {}", self.fact_check),
            format!("Context: {}", self.context),
        ]
        .join("\n\n")
    }
}

impl fmt::Display for FactCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_text())
    }
}

/// Whether a narrative or truth field carries backend output
pub fn is_provided(value: &str) -> bool {
    value != NOT_PROVIDED
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FactCheckReport {
        FactCheckReport::new(
            "80%",
            "Mostly accurate [1].",
            "Background [2].",
            vec![
                Source::new("1", "Agency report", "https://example.org/report"),
                Source::new("2", "Archive", PLACEHOLDER_URL),
            ],
        )
    }

    #[test]
    fn default_report_uses_sentinels() {
        let report = FactCheckReport::default();
        assert_eq!(report.truth_percentage, NOT_PROVIDED);
        assert!(!is_provided(&report.fact_check));
        assert!(report.sources.is_empty());
    }

    #[test]
    fn plain_text_layout_is_stable() {
        let text = sample().to_plain_text();
        assert_eq!(
            text,
            "Sources:\n1. [Agency report](https://example.org/report)\n2. [Archive](#)\n\n\
             Truth: 80%\n\nFact Check: Mostly accurate [1].\n\nContext: Background [2]."
        );
    }

    #[test]
    fn plain_text_reparses_to_same_report() {
        let report = sample();
        assert_eq!(parse(&report.to_plain_text()), report);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["truthPercentage"], "80%");
        assert_eq!(value["factCheck"], "Mostly accurate [1].");
        assert_eq!(value["sources"][1]["url"], "#");
    }

    #[test]
    fn source_lookup_by_label() {
        let report = sample();
        assert_eq!(report.source("2").map(|s| s.title.as_str()), Some("Archive"));
        assert!(report.source("3").is_none());
        assert!(!report.sources[1].has_url());
    }
}
