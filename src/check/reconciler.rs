//! Report reconciler for combining outputs from multiple backends
//!
//! Deduplicates sources by URL, averages truth percentages and keeps each
//! backend's narrative under its own label.

use super::types::{AttributedReport, CheckError};
use crate::report::{self, FactCheckReport, Source, NOT_PROVIDED, TRUTH_UNAVAILABLE};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merges per-backend reports into one
#[derive(Debug, Clone)]
pub struct ReportReconciler {
    /// Separator placed between labelled narrative sections
    pub section_separator: String,
}

impl Default for ReportReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportReconciler {
    pub fn new() -> Self {
        Self {
            section_separator: "\n\n".to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.section_separator = separator.into();
        self
    }

    /// Merge one or more reports.
    ///
    /// A single report with a consistent source list comes back unchanged.
    /// Calling with no reports is a contract violation reported as
    /// [`CheckError::ReconcileOnEmptyInput`].
    pub fn reconcile(&self, reports: &[AttributedReport]) -> Result<FactCheckReport, CheckError> {
        match reports {
            [] => Err(CheckError::ReconcileOnEmptyInput),
            [single] if sources_are_consistent(&single.report.sources) => Ok(single.report.clone()),
            [single] => Ok(normalize(single)),
            _ => Ok(self.merge_many(reports)),
        }
    }

    fn merge_many(&self, reports: &[AttributedReport]) -> FactCheckReport {
        let (sources, narratives) = merge_citations(reports);

        let fact_check = self.labelled_sections(
            reports
                .iter()
                .zip(&narratives)
                .map(|(r, (fact_check, _))| (r.backend.as_str(), fact_check.as_str())),
        );
        let context = self.labelled_sections(
            reports
                .iter()
                .zip(&narratives)
                .map(|(r, (_, context))| (r.backend.as_str(), context.as_str())),
        );

        FactCheckReport {
            truth_percentage: merge_truth(reports.iter().map(|r| r.report.truth_percentage.as_str())),
            fact_check,
            context,
            sources,
        }
    }

    /// Concatenate `name: text` sections, skipping absent narratives
    fn labelled_sections<'a>(&self, parts: impl Iterator<Item = (&'a str, &'a str)>) -> String {
        let sections: Vec<String> = parts
            .filter(|(_, text)| report::is_provided(text))
            .map(|(name, text)| format!("{}: {}", name, text))
            .collect();

        if sections.is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            sections.join(&self.section_separator)
        }
    }
}

/// [`ReportReconciler::reconcile`] with default settings
pub fn reconcile(reports: &[AttributedReport]) -> Result<FactCheckReport, CheckError> {
    ReportReconciler::new().reconcile(reports)
}

/// Labels are unique and no non-placeholder URL repeats
fn sources_are_consistent(sources: &[Source]) -> bool {
    let mut labels = HashSet::new();
    let mut urls = HashSet::new();
    sources
        .iter()
        .all(|s| labels.insert(s.index.as_str()) && (!s.has_url() || urls.insert(s.url.as_str())))
}

/// Repair one report's source list without labelling its narratives
fn normalize(single: &AttributedReport) -> FactCheckReport {
    let (sources, mut narratives) = merge_citations(std::slice::from_ref(single));
    let (fact_check, context) = narratives.pop().unwrap_or_default();
    FactCheckReport {
        truth_percentage: single.report.truth_percentage.clone(),
        fact_check,
        context,
        sources,
    }
}

/// Merge source lists and rewrite every report's narratives onto the merged
/// labels. Returns the merged sources and `(fact_check, context)` per report.
fn merge_citations(reports: &[AttributedReport]) -> (Vec<Source>, Vec<(String, String)>) {
    let (sources, mut label_maps) = merge_sources(reports);
    let merged_labels: HashSet<&str> = sources.iter().map(|s| s.index.as_str()).collect();

    // A citation missing from its own report's sources must not land on
    // another report's source, so it moves to a label nothing resolves to.
    let mut next_spare = sources.len() + 1;
    let mut narratives = Vec::with_capacity(reports.len());
    for (attributed, mapping) in reports.iter().zip(label_maps.iter_mut()) {
        let report = &attributed.report;
        let own: HashSet<&str> = report.sources.iter().map(|s| s.index.as_str()).collect();
        let cited = report::cited_indices(&report.fact_check)
            .into_iter()
            .chain(report::cited_indices(&report.context));

        for index in cited {
            if own.contains(index.as_str())
                || !merged_labels.contains(index.as_str())
                || mapping.contains_key(&index)
            {
                continue;
            }
            while merged_labels.contains(next_spare.to_string().as_str()) {
                next_spare += 1;
            }
            debug!(backend = %attributed.backend, %index, spare = next_spare, "dangling citation moved");
            mapping.insert(index, next_spare.to_string());
            next_spare += 1;
        }

        narratives.push((
            relabel_field(&report.fact_check, mapping),
            relabel_field(&report.context, mapping),
        ));
    }

    (sources, narratives)
}

fn relabel_field(text: &str, mapping: &HashMap<String, String>) -> String {
    if report::is_provided(text) {
        report::relabel(text, mapping)
    } else {
        text.to_string()
    }
}

/// Merged source list under construction
#[derive(Default)]
struct SourceMerge {
    sources: Vec<Source>,
    label_by_url: HashMap<String, String>,
    used_labels: HashSet<String>,
    next_label: usize,
}

impl SourceMerge {
    fn existing_label(&self, source: &Source) -> Option<String> {
        if source.has_url() {
            self.label_by_url.get(&source.url).cloned()
        } else {
            None
        }
    }

    fn push(&mut self, label: String, source: &Source) -> String {
        if source.has_url() {
            self.label_by_url.insert(source.url.clone(), label.clone());
        }
        self.used_labels.insert(label.clone());
        self.sources.push(Source {
            index: label.clone(),
            ..source.clone()
        });
        label
    }

    fn fresh_label(&mut self) -> String {
        while self.used_labels.contains(&self.next_label.to_string()) {
            self.next_label += 1;
        }
        let label = self.next_label.to_string();
        self.next_label += 1;
        label
    }

    /// Fold `source` into the list under a fresh label unless its URL is
    /// already present, recording where its original label now points
    fn append(&mut self, mapping: &mut HashMap<String, String>, source: &Source) {
        let label = match self.existing_label(source) {
            Some(existing) => existing,
            None => {
                let fresh = self.fresh_label();
                self.push(fresh, source)
            }
        };
        mapping.entry(source.index.clone()).or_insert(label);
    }
}

/// Merge source lists, deduplicating on exact URL.
///
/// Returns the merged list and, per input report, the mapping from its
/// original labels to labels in the merged list. The first report keeps its
/// labels except where one repeats; a repeated label refers to its first
/// entry and the later entry is appended under a fresh label.
fn merge_sources(reports: &[AttributedReport]) -> (Vec<Source>, Vec<HashMap<String, String>>) {
    let mut merge = SourceMerge::default();
    let mut label_maps = Vec::with_capacity(reports.len());

    let Some((first, rest)) = reports.split_first() else {
        return (merge.sources, label_maps);
    };

    let mut mapping = HashMap::new();
    let mut displaced = Vec::new();
    for source in &first.report.sources {
        if let Some(existing) = merge.existing_label(source) {
            mapping.entry(source.index.clone()).or_insert(existing);
        } else if merge.used_labels.contains(&source.index) {
            displaced.push(source);
        } else {
            let label = merge.push(source.index.clone(), source);
            mapping.entry(source.index.clone()).or_insert(label);
        }
    }

    merge.next_label = merge.sources.len() + 1;
    for source in displaced {
        merge.append(&mut mapping, source);
    }
    label_maps.push(mapping);

    for attributed in rest {
        let mut mapping = HashMap::new();
        for source in &attributed.report.sources {
            merge.append(&mut mapping, source);
        }
        label_maps.push(mapping);
    }

    (merge.sources, label_maps)
}

/// Parse a truth percentage: leading digits after trimming, within 0..=100
pub fn parse_percentage(value: &str) -> Option<u8> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..digits_end]
        .parse::<u32>()
        .ok()
        .filter(|n| *n <= 100)
        .and_then(|n| u8::try_from(n).ok())
}

/// Average the parseable percentages
fn merge_truth<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let parsed: Vec<(&str, u8)> = values
        .filter_map(|v| parse_percentage(v).map(|n| (v, n)))
        .collect();

    match parsed.as_slice() {
        [] => TRUTH_UNAVAILABLE.to_string(),
        [(original, _)] => original.to_string(),
        many => {
            let sum: u32 = many.iter().map(|(_, n)| u32::from(*n)).sum();
            let mean = f64::from(sum) / many.len() as f64;
            format!("{}%", mean.round() as u32)
        }
    }
}
