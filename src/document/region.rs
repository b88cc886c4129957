//! Styling regions and per-line analysis results.
//!
//! Regions are stored relative to the start of the line that produced them so
//! that edits elsewhere in the document only need to move whole lines around,
//! never rewrite their contents. They are converted to document coordinates
//! on the way out.

use std::ops::Range;

/// What a region of text was classified as.
///
/// The kinds are purely presentational; the LSP layer maps them to semantic
/// token types and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Property name left of the assignment operator.
    Key,
    /// Everything right of the assignment operator.
    Value,
    /// From `#` to the end of the line.
    Comment,
    /// A line with no assignment operator.
    Malformed,
    /// The `=` or `+=` operator.
    Assignment,
    /// A path-like value that does not exist on disk.
    InvalidPath,
    /// A key that another configuration source also defines.
    RedefinedKey,
}

impl RegionKind {
    /// Overlay kinds decorate whatever is already painted underneath them.
    pub fn is_overlay(self) -> bool {
        matches!(self, RegionKind::InvalidPath | RegionKind::RedefinedKey)
    }
}

/// An annotated span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub len: usize,
    pub kind: RegionKind,
}

impl Region {
    pub fn new(start: usize, len: usize, kind: RegionKind) -> Self {
        Self { start, len, kind }
    }

    /// Region covering `span`.
    pub fn from_span(span: Range<usize>, kind: RegionKind) -> Self {
        Self::new(span.start, span.end.saturating_sub(span.start), kind)
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Move the region `offset` bytes to the right.
    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            ..self
        }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.span().contains(&offset)
    }
}

/// A semantic problem found on a line, backing one of its regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: RegionKind,
    pub span: Range<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(kind: RegionKind, span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            kind: self.kind,
            span: self.span.start + offset..self.span.end + offset,
            message: self.message.clone(),
        }
    }
}

/// Everything computed for a single line, in line-relative coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineAnalysis {
    /// Regions in paint order; later entries are drawn over earlier ones.
    regions: Vec<Region>,
    findings: Vec<Finding>,
}

impl LineAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region. Empty regions carry no styling and are dropped.
    pub fn push(&mut self, region: Region) {
        if region.len > 0 {
            self.regions.push(region);
        }
    }

    pub fn push_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn has(&self, kind: RegionKind) -> bool {
        self.regions.iter().any(|r| r.kind == kind)
    }

    /// Regions translated to document coordinates for a line starting at `line_start`.
    pub fn to_host(&self, line_start: usize) -> impl Iterator<Item = Region> + '_ {
        self.regions.iter().map(move |r| r.shifted(line_start))
    }

    /// Findings translated to document coordinates for a line starting at `line_start`.
    pub fn findings_to_host(&self, line_start: usize) -> impl Iterator<Item = Finding> + '_ {
        self.findings.iter().map(move |f| f.shifted(line_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_regions_are_dropped() {
        let mut line = LineAnalysis::new();
        line.push(Region::new(0, 0, RegionKind::Key));
        line.push(Region::new(0, 3, RegionKind::Key));
        assert_eq!(line.regions().len(), 1);
    }

    #[test]
    fn regions_map_to_host_offsets() {
        let mut line = LineAnalysis::new();
        line.push(Region::new(0, 3, RegionKind::Key));
        line.push(Region::new(3, 1, RegionKind::Assignment));

        let host: Vec<_> = line.to_host(100).collect();
        assert_eq!(host[0].span(), 100..103);
        assert_eq!(host[1].span(), 103..104);
    }

    #[test]
    fn findings_map_to_host_offsets() {
        let mut line = LineAnalysis::new();
        line.push_finding(Finding::new(RegionKind::InvalidPath, 4..9, "Invalid path:/nope"));

        let host: Vec<_> = line.findings_to_host(10).collect();
        assert_eq!(host[0].span, 14..19);
        assert_eq!(host[0].message, "Invalid path:/nope");
    }

    #[test]
    fn region_from_span() {
        let region = Region::from_span(5..15, RegionKind::Value);
        assert_eq!(region.start, 5);
        assert_eq!(region.len, 10);
        assert!(region.contains(5));
        assert!(region.contains(14));
        assert!(!region.contains(15));
    }

    #[test]
    fn overlay_kinds() {
        assert!(RegionKind::RedefinedKey.is_overlay());
        assert!(RegionKind::InvalidPath.is_overlay());
        assert!(!RegionKind::Comment.is_overlay());
        assert!(!RegionKind::Key.is_overlay());
    }
}
