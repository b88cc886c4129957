//! Structural classification of a single properties line.
//!
//! A line is either an assignment (`key=value` or `key+=value`) or malformed.
//! Independently of that, a `#` anywhere on the line starts a comment that
//! runs to the end of the line.

use std::ops::Range;

use crate::document::{Region, RegionKind};

/// Characters separating the individual values of a multi-valued assignment.
const VALUE_DELIMITERS: [char; 3] = [',', ';', '\\'];

/// Byte ranges of the parts of an assignment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: Range<usize>,
    pub operator: Range<usize>,
    pub value: Range<usize>,
}

impl Assignment {
    pub fn key_text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.key.clone()]
    }

    pub fn value_text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.value.clone()]
    }

    pub fn is_append(&self) -> bool {
        self.operator.len() == 2
    }
}

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClass {
    /// `None` when the line has no assignment operator.
    pub assignment: Option<Assignment>,
    /// Start of the comment, if the line contains `#`.
    pub comment: Option<usize>,
    len: usize,
}

impl LineClass {
    pub fn is_malformed(&self) -> bool {
        self.assignment.is_none()
    }

    /// Directive lines (`@using = ...`) get structural styling only.
    pub fn is_directive(&self, line: &str) -> bool {
        self.assignment
            .as_ref()
            .is_some_and(|a| a.key_text(line).contains('@'))
    }

    /// Key, value and operator regions, or a single malformed region.
    pub fn structural_regions(&self) -> Vec<Region> {
        match &self.assignment {
            Some(a) => vec![
                Region::from_span(a.key.clone(), RegionKind::Key),
                Region::from_span(a.value.clone(), RegionKind::Value),
                Region::from_span(a.operator.clone(), RegionKind::Assignment),
            ],
            None => vec![Region::new(0, self.len, RegionKind::Malformed)],
        }
    }

    pub fn comment_region(&self) -> Option<Region> {
        self.comment
            .map(|start| Region::new(start, self.len - start, RegionKind::Comment))
    }

    /// All structural regions in paint order, comment last.
    pub fn regions(&self) -> Vec<Region> {
        let mut regions = self.structural_regions();
        regions.extend(self.comment_region());
        regions
    }
}

/// Classify a line of text (without its line terminator).
pub fn classify(line: &str) -> LineClass {
    let operator = line
        .find("+=")
        .map(|i| i..i + 2)
        .or_else(|| line.find('=').map(|i| i..i + 1));

    let assignment = operator.map(|op| Assignment {
        key: 0..op.start,
        value: op.end..line.len(),
        operator: op,
    });

    LineClass {
        assignment,
        comment: line.find('#'),
        len: line.len(),
    }
}

/// Split a value clause into its individual values.
///
/// Empty values between adjacent delimiters are kept.
pub fn split_values(value: &str) -> Vec<&str> {
    value.split(VALUE_DELIMITERS).collect()
}

/// Like [`split_values`], but each value comes with its byte offset in `value`.
pub fn split_value_spans(value: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if VALUE_DELIMITERS.contains(&c) {
            spans.push((start, &value[start..i]));
            start = i + c.len_utf8();
        }
    }
    spans.push((start, &value[start..]));
    spans
}

/// Whether a value looks like a Unix or Windows path. Says nothing about existence.
pub fn looks_like_path(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}
