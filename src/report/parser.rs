//! Report parser
//!
//! Turns one backend's free-text answer into a [`FactCheckReport`].
//!
//! The text is scanned as a sequence of blank-line separated blocks. A block
//! that opens with a section label (`Sources:`, `Truth:`, `Fact Check:`,
//! `Context:`) switches the active section; any other block continues the
//! active narrative section. Parsing never fails: anything that does not fit
//! the convention is dropped and absent sections keep the
//! [`NOT_PROVIDED`] sentinel.

use super::{FactCheckReport, Source, NOT_PROVIDED, PLACEHOLDER_URL};
use regex_lite::Regex;
use std::sync::OnceLock;

/// Section labels, matched case-insensitively at the start of a block
const LABELS: [(Section, &str); 4] = [
    (Section::Sources, "sources"),
    (Section::Truth, "truth"),
    (Section::FactCheck, "fact check"),
    (Section::Context, "context"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Sources,
    Truth,
    FactCheck,
    Context,
}

/// `<index>. <content>`
fn source_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([0-9]+)\.\s+(.*\S)\s*$").expect("source line pattern is valid")
    })
}

/// `[title](url)`
fn markdown_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[([^\]]*)\]\(\s*([^)\s]+)\s*\)").expect("markdown link pattern is valid")
    })
}

/// Accumulates section contents while walking the blocks
#[derive(Default)]
struct Sections {
    truth: Option<String>,
    fact_check: Option<String>,
    context: Option<String>,
    sources: Option<Vec<Source>>,
}

impl Sections {
    fn start(&mut self, section: Section, body: &str) {
        match section {
            Section::Sources => {
                let sources = self.sources.get_or_insert_with(Vec::new);
                sources.extend(body.lines().filter_map(parse_source_line));
            }
            Section::Truth => {
                if self.truth.is_none() {
                    self.truth = Some(body.trim().to_string());
                }
            }
            Section::FactCheck => append(&mut self.fact_check, body.trim()),
            Section::Context => append(&mut self.context, body.trim()),
        }
    }

    fn continue_with(&mut self, section: Section, block: &str) {
        match section {
            Section::FactCheck => append(&mut self.fact_check, block.trim()),
            Section::Context => append(&mut self.context, block.trim()),
            Section::Sources | Section::Truth => {}
        }
    }

    fn into_report(self) -> FactCheckReport {
        let or_missing = |value: Option<String>| value.unwrap_or_else(|| NOT_PROVIDED.to_string());
        FactCheckReport {
            truth_percentage: or_missing(self.truth),
            fact_check: or_missing(self.fact_check),
            context: or_missing(self.context),
            sources: self.sources.unwrap_or_default(),
        }
    }
}

/// Space-join `text` onto a narrative field, creating it if absent
fn append(field: &mut Option<String>, text: &str) {
    match field {
        Some(existing) if !text.is_empty() => {
            if !existing.is_empty() {
                existing.push(' ');
            }
            existing.push_str(text);
        }
        Some(_) => {}
        None => *field = Some(text.to_string()),
    }
}

/// Parse a raw backend report
pub fn parse(raw: &str) -> FactCheckReport {
    let normalized = raw.replace("\r\n", "\n");
    let mut sections = Sections::default();
    let mut current: Option<Section> = None;

    for block in split_blocks(&normalized) {
        match split_label(&block) {
            Some((section, body)) => {
                sections.start(section, body);
                current = Some(section);
            }
            None => {
                if let Some(section) = current {
                    sections.continue_with(section, &block);
                }
            }
        }
    }

    sections.into_report()
}

/// Split text into blocks separated by blank (whitespace-only) lines
fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                blocks.push(lines.join("\n"));
                lines.clear();
            }
        } else {
            lines.push(line);
        }
    }
    if !lines.is_empty() {
        blocks.push(lines.join("\n"));
    }

    blocks
}

/// Recognize a section label at the start of a block.
///
/// Tolerates markdown decoration such as `**Truth:**` or `## Context:`.
/// Returns the section and the rest of the block after the colon.
fn split_label(block: &str) -> Option<(Section, &str)> {
    let is_decoration = |c: char| c == '*' || c == '_' || c == '#';
    let stripped = block.trim_start_matches(|c: char| is_decoration(c) || c.is_whitespace());

    for (section, name) in LABELS {
        let Some(head) = stripped.get(..name.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(name) {
            continue;
        }
        let after = stripped[name.len()..].trim_start_matches(is_decoration);
        if let Some(body) = after.strip_prefix(':') {
            return Some((section, body.trim_start_matches(is_decoration)));
        }
    }

    None
}

/// Parse one `N. content` line of the `Sources:` section
fn parse_source_line(line: &str) -> Option<Source> {
    let caps = source_line_pattern().captures(line)?;
    let index = caps.get(1)?.as_str();
    let content = caps.get(2)?.as_str();

    let source = match markdown_link_pattern().captures(content) {
        Some(link) => Source::new(
            index,
            link.get(1).map_or("", |m| m.as_str()).trim(),
            link.get(2).map_or(PLACEHOLDER_URL, |m| m.as_str()),
        ),
        None => Source::new(index, content.trim(), PLACEHOLDER_URL),
    };
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Sources:\n\
        1. [NASA Moon facts](https://nasa.gov/moon)\n\
        2. [Encyclopedia entry](https://example.org/moon)\n\
        \n\
        Truth: 85%\n\
        \n\
        Fact Check: The Moon landing happened in 1969 [1].\n\
        \n\
        Context: Six crewed landings followed [1, 2].";

    #[test]
    fn parses_well_formed_report() {
        let report = parse(WELL_FORMED);

        assert_eq!(report.truth_percentage, "85%");
        assert_eq!(report.fact_check, "The Moon landing happened in 1969 [1].");
        assert_eq!(report.context, "Six crewed landings followed [1, 2].");
        assert_eq!(
            report.sources,
            vec![
                Source::new("1", "NASA Moon facts", "https://nasa.gov/moon"),
                Source::new("2", "Encyclopedia entry", "https://example.org/moon"),
            ]
        );
    }

    #[test]
    fn sections_may_appear_in_any_order() {
        let raw = "Context: Background.\n\nTruth: 40%\n\nFact Check: Misleading.\n\n\
                   Sources:\n1. [A](https://a.example)";
        let report = parse(raw);

        assert_eq!(report.truth_percentage, "40%");
        assert_eq!(report.fact_check, "Misleading.");
        assert_eq!(report.context, "Background.");
        assert_eq!(report.sources.len(), 1);
    }

    #[test]
    fn missing_sources_yields_empty_list() {
        let raw = "Truth: 50%\n\nFact Check: Unclear.\n\nContext: Disputed.";
        let report = parse(raw);

        assert!(report.sources.is_empty());
        assert_eq!(report.truth_percentage, "50%");
        assert_eq!(report.fact_check, "Unclear.");
        assert_eq!(report.context, "Disputed.");
    }

    #[test]
    fn only_absent_sections_get_sentinel() {
        let report = parse("Fact Check: Only a verdict.");

        assert_eq!(report.fact_check, "Only a verdict.");
        assert_eq!(report.truth_percentage, NOT_PROVIDED);
        assert_eq!(report.context, NOT_PROVIDED);
    }

    #[test]
    fn empty_section_is_distinct_from_missing() {
        let report = parse("Context:\n\nTruth: 10%");
        assert_eq!(report.context, "");
        assert_eq!(report.fact_check, NOT_PROVIDED);
    }

    #[test]
    fn continuation_paragraphs_join_active_narrative() {
        let raw = "Fact Check: First paragraph.\n\nSecond paragraph.\n\n\n  \n\
                   Third paragraph.\n\nContext: Ctx.\n\nMore ctx.";
        let report = parse(raw);

        assert_eq!(
            report.fact_check,
            "First paragraph. Second paragraph. Third paragraph."
        );
        assert_eq!(report.context, "Ctx. More ctx.");
    }

    #[test]
    fn blocks_outside_narrative_sections_are_dropped() {
        let raw = "Here is my analysis.\n\nTruth: 70%\n\nstray text\n\n\
                   Sources:\n1. [A](https://a.example)\n\n3. [Late](https://late.example)";
        let report = parse(raw);

        assert_eq!(report.truth_percentage, "70%");
        assert_eq!(report.fact_check, NOT_PROVIDED);
        assert_eq!(report.context, NOT_PROVIDED);
        assert_eq!(report.sources.len(), 1);
    }

    #[test]
    fn source_without_link_gets_placeholder_url() {
        let raw = "Sources:\n1. Smith, History of Rome (1999)\nnot a source line\n7. [Seven](https://seven.example)";
        let report = parse(raw);

        assert_eq!(report.sources.len(), 2);
        assert_eq!(report.sources[0].title, "Smith, History of Rome (1999)");
        assert_eq!(report.sources[0].url, PLACEHOLDER_URL);
        assert_eq!(report.sources[1].index, "7");
        assert_eq!(report.sources[1].url, "https://seven.example");
    }

    #[test]
    fn tolerates_crlf_and_markdown_labels() {
        let raw = "**Sources:**\r\n1. [A](https://a.example)\r\n\r\n**Truth:** 65%\r\n\r\n\
                   ## Fact Check: Partly true.\r\n\r\n**Context**: Details.";
        let report = parse(raw);

        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.truth_percentage, "65%");
        assert_eq!(report.fact_check, "Partly true.");
        assert_eq!(report.context, "Details.");
    }

    #[test]
    fn labels_are_case_insensitive_but_need_colon() {
        let report = parse("TRUTH: 20%\n\nfact check: Wrong.\n\nContextually speaking, no.");
        assert_eq!(report.truth_percentage, "20%");
        assert_eq!(report.fact_check, "Wrong. Contextually speaking, no.");
        assert_eq!(report.context, NOT_PROVIDED);
    }

    #[test]
    fn handles_unicode_text() {
        let raw = "Fact Check: Καλημέρα — 你好 [1].\n\nSources:\n1. [Ελληνικά](https://el.example/ά)\n\nTruth: 90%";
        let report = parse(raw);

        assert_eq!(report.fact_check, "Καλημέρα — 你好 [1].");
        assert_eq!(report.sources[0].title, "Ελληνικά");
        assert_eq!(report.sources[0].url, "https://el.example/ά");
    }

    #[test]
    fn repeated_truth_keeps_first_value() {
        let report = parse("Truth: 30%\n\nTruth: 90%");
        assert_eq!(report.truth_percentage, "30%");
    }

    #[test]
    fn garbage_input_degrades_to_defaults() {
        for raw in ["", "\n\n\n", "no labels at all", "[1] [2]", "::::"] {
            assert_eq!(parse(raw), FactCheckReport::default(), "input: {raw:?}");
        }
    }
}
