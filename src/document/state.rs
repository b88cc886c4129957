//! Document state management for the properties LSP.
//!
//! `PropertyDocument` keeps the text of one open file together with the
//! analysis of each of its lines. Edits only re-analyze the lines they touch;
//! every other line keeps its previous result.

use std::fmt;
use std::iter;
use std::ops::Range;
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use crate::analysis::{
    build_error_message, classify, detect_overrides, looks_like_path, split_value_spans,
    validate_path, PathExistenceCheck, SourceRegistry, VariableLookup,
};

use super::region::{Finding, LineAnalysis, Region, RegionKind};
use super::text::LineIndex;

/// An open properties file and its incremental highlighting state.
pub struct PropertyDocument {
    line_index: LineIndex,
    /// One entry per line of `line_index`, in line-relative coordinates.
    lines: Vec<LineAnalysis>,
    registry: SourceRegistry,
    current_origin: Option<String>,
    variables: Arc<dyn VariableLookup>,
    paths: Arc<dyn PathExistenceCheck>,
    warning: String,
    /// Document version from the client.
    pub version: i32,
}

impl PropertyDocument {
    /// Attach to `text` and analyze every line of it.
    ///
    /// `current_origin` identifies the file this document was loaded from;
    /// sources with that origin are its own definitions, not overrides.
    pub fn attach(
        text: String,
        registry: SourceRegistry,
        current_origin: Option<String>,
        variables: Arc<dyn VariableLookup>,
        paths: Arc<dyn PathExistenceCheck>,
    ) -> Self {
        let line_index = LineIndex::new(text);
        let lines = vec![LineAnalysis::default(); line_index.line_count()];
        let mut doc = Self {
            line_index,
            lines,
            registry,
            current_origin,
            variables,
            paths,
            warning: String::new(),
            version: 0,
        };
        doc.rescan();
        doc
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), String> {
        self.replace(offset..offset, text)
    }

    /// Remove `len` bytes starting at `offset`.
    pub fn remove(&mut self, offset: usize, len: usize) -> Result<(), String> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| format!("edit length {} overflows", len))?;
        self.replace(offset..end, "")
    }

    /// Replace `range` with `text`, then re-highlight the lines the edit touched.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<(), String> {
        self.lines
            .resize_with(self.line_index.line_count(), LineAnalysis::default);
        let first = self.line_index.line_of_offset(range.start);
        let last = self.line_index.line_of_offset(range.end);
        let offset = range.start;

        self.line_index.replace_range(range, text)?;

        // Lines outside first..=last are untouched and keep their results;
        // the replaced lines become placeholders for `on_edit` to fill.
        let new_lines = text.matches('\n').count() + 1;
        self.lines.splice(
            first..=last,
            iter::repeat_with(LineAnalysis::default).take(new_lines),
        );

        self.on_edit(offset, text.len());
        Ok(())
    }

    /// Replace the whole text, as a full-document sync does.
    pub fn set_text(&mut self, text: &str) -> Result<(), String> {
        self.replace(0..self.line_index.source().len(), text)
    }

    /// Re-highlight the lines spanned by `offset..offset + length`.
    ///
    /// Called after the edit has been applied. Deletions pass a length of 0.
    /// Clears the warning line; only the touched lines are re-analyzed.
    pub fn on_edit(&mut self, offset: usize, length: usize) {
        self.warning.clear();
        self.lines
            .resize_with(self.line_index.line_count(), LineAnalysis::default);

        let start_line = self.line_index.line_of_offset(offset);
        let end_line = self
            .line_index
            .line_of_offset(offset.saturating_add(length));

        for line in start_line..=end_line {
            let (analysis, warning) = self.analyze_line(line);
            self.lines[line] = analysis;
            if let Some(warning) = warning {
                self.warning = warning;
            }
        }
    }

    /// Re-highlight every line.
    pub fn rescan(&mut self) {
        self.lines.clear();
        self.on_edit(0, self.line_index.source().len());
    }

    /// Swap in freshly loaded configuration sources.
    ///
    /// Existing highlighting is left alone until lines are edited or
    /// [`rescan`](Self::rescan) is called.
    pub fn reload(&mut self, registry: SourceRegistry) {
        self.registry = registry;
    }

    /// Classify one line and run the override and path checks on it.
    ///
    /// Returns the line's analysis and, if the line set one, the new warning
    /// line. Within a line a failing path replaces the override message.
    fn analyze_line(&self, line: usize) -> (LineAnalysis, Option<String>) {
        let text = self.line_index.line_text(line);
        let class = classify(text);
        let mut analysis = LineAnalysis::new();
        let mut warning = None;

        for region in class.structural_regions() {
            analysis.push(region);
        }

        match &class.assignment {
            None => {
                analysis.push_finding(Finding::new(
                    RegionKind::Malformed,
                    0..text.len(),
                    "expected an assignment: `key=value` or `key+=value`",
                ));
            }
            Some(assignment) if !class.is_directive(text) => {
                let key = assignment.key_text(text);
                let report =
                    detect_overrides(key, self.current_origin.as_deref(), &self.registry);
                if report.flagged {
                    analysis.push(Region::from_span(
                        assignment.key.clone(),
                        RegionKind::RedefinedKey,
                    ));
                }
                for message in &report.warnings {
                    analysis.push_finding(Finding::new(
                        RegionKind::RedefinedKey,
                        assignment.key.clone(),
                        message.clone(),
                    ));
                }
                warning = Some(build_error_message(&report.warnings));

                let value_start = assignment.value.start;
                for (offset, value) in split_value_spans(assignment.value_text(text)) {
                    if !looks_like_path(value) {
                        continue;
                    }
                    let check = validate_path(
                        value,
                        value_start + offset,
                        self.variables.as_ref(),
                        self.paths.as_ref(),
                    );
                    if let (Some(region), Some(message)) = (check.region, check.message) {
                        analysis.push(region);
                        analysis.push_finding(Finding::new(
                            RegionKind::InvalidPath,
                            region.span(),
                            message.clone(),
                        ));
                        warning = Some(message);
                    }
                }
            }
            Some(_) => {}
        }

        if let Some(comment) = class.comment_region() {
            analysis.push(comment);
        }
        (analysis, warning)
    }

    /// The warning line produced by the most recent edit.
    pub fn warning(&self) -> &str {
        &self.warning
    }

    pub fn text(&self) -> &str {
        self.line_index.source()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn current_origin(&self) -> Option<&str> {
        self.current_origin.as_deref()
    }

    pub fn variables(&self) -> &dyn VariableLookup {
        self.variables.as_ref()
    }

    /// Line-relative analysis of `line`.
    pub fn line_analysis(&self, line: usize) -> Option<&LineAnalysis> {
        self.lines.get(line)
    }

    /// Regions of `line` in document coordinates.
    pub fn line_regions(&self, line: usize) -> Vec<Region> {
        let start = self.line_index.line_start(line);
        self.lines
            .get(line)
            .map(|analysis| analysis.to_host(start).collect())
            .unwrap_or_default()
    }

    /// All regions in document coordinates, line by line in paint order.
    pub fn regions(&self) -> Vec<Region> {
        (0..self.lines.len())
            .flat_map(|line| self.line_regions(line))
            .collect()
    }

    /// All findings in document coordinates.
    pub fn findings(&self) -> Vec<Finding> {
        self.lines
            .iter()
            .enumerate()
            .flat_map(|(line, analysis)| {
                analysis.findings_to_host(self.line_index.line_start(line))
            })
            .collect()
    }
}

impl fmt::Debug for PropertyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDocument")
            .field("line_index", &self.line_index)
            .field("lines", &self.lines)
            .field("registry", &self.registry)
            .field("current_origin", &self.current_origin)
            .field("warning", &self.warning)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, PropertyDocument>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or replace a document.
    pub fn open(&self, uri: Url, document: PropertyDocument) {
        self.documents.insert(uri, document);
    }

    /// Close a document.
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Run `f` against a document's state.
    pub fn with<R>(&self, uri: &Url, f: impl FnOnce(&PropertyDocument) -> R) -> Option<R> {
        self.documents.get(uri).map(|doc| f(&doc))
    }

    /// Run `f` against a document's state, allowing edits.
    pub fn with_mut<R>(
        &self,
        uri: &Url,
        f: impl FnOnce(&mut PropertyDocument) -> R,
    ) -> Option<R> {
        self.documents.get_mut(uri).map(|mut doc| f(&mut doc))
    }
}
