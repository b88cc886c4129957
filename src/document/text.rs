//! Text utilities for line lookup and position conversion.
//!
//! Provides efficient byte offset <-> LSP position conversion with proper UTF-16 handling,
//! plus the line boundaries the incremental highlighter works in.

use std::ops::Range;

use tower_lsp::lsp_types::Position;

/// Pre-computed line index for efficient position lookups.
///
/// LSP positions use line/column where column is in UTF-16 code units.
/// This struct pre-computes line start offsets for O(log n) lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    /// Source text (needed for UTF-16 column calculation).
    source: String,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            line_starts,
            source,
        }
    }

    /// Get the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of lines. A trailing newline starts a final, empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Index of the line containing `offset`. Offsets past the end map to the last line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    /// Byte offset of the start of `line`.
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len())
    }

    /// Byte range of `line`, including its terminator.
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let start = self.line_start(line);
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());
        start..end
    }

    /// Text of `line` without its `\n` or `\r\n` terminator.
    pub fn line_text(&self, line: usize) -> &str {
        let text = &self.source[self.line_range(line)];
        let text = text.strip_suffix('\n').unwrap_or(text);
        text.strip_suffix('\r').unwrap_or(text)
    }

    /// Replace `range` of the source with `text` and recompute line starts.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> Result<(), String> {
        if range.start > range.end || range.end > self.source.len() {
            return Err(format!(
                "edit range {}..{} is outside the document (length {})",
                range.start,
                range.end,
                self.source.len()
            ));
        }
        if !self.source.is_char_boundary(range.start) || !self.source.is_char_boundary(range.end)
        {
            return Err(format!(
                "edit range {}..{} splits a character",
                range.start, range.end
            ));
        }

        self.source.replace_range(range, text);
        self.line_starts = compute_line_starts(&self.source);
        Ok(())
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// Uses binary search for O(log n) line lookup, then scans the line for UTF-16 column.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let line = self.line_of_offset(offset);
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());

        // Calculate UTF-16 column
        let mut col = 0u32;
        let line_slice = &self.source[line_start..line_end];

        for (i, c) in line_slice.char_indices() {
            if line_start + i >= offset {
                break;
            }
            col += c.len_utf16() as u32;
        }

        Position::new(line as u32, col)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns None if the position is out of bounds.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;

        if line >= self.line_starts.len() {
            return None;
        }

        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|&end| end.saturating_sub(1)) // Exclude newline
            .unwrap_or(self.source.len());

        let line_slice = &self.source[line_start..line_end];

        // Walk UTF-16 code units to find byte offset
        let mut utf16_col = 0u32;
        for (i, c) in line_slice.char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        // Position is at or past end of line
        Some(line_end.min(self.source.len()))
    }

    /// Convert an LSP range to a byte span.
    pub fn range_to_span(&self, range: tower_lsp::lsp_types::Range) -> Option<Range<usize>> {
        let start = self.position_to_offset(range.start)?;
        let end = self.position_to_offset(range.end)?;
        Some(start..end.max(start))
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &Range<usize>) -> tower_lsp::lsp_types::Range {
        let start = self.offset_to_position(span.start);
        let end = self.offset_to_position(span.end);
        tower_lsp::lsp_types::Range::new(start, end)
    }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let idx = LineIndex::new("hello world".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 5));
        assert_eq!(idx.offset_to_position(11), Position::new(0, 11));
    }

    #[test]
    fn multi_line() {
        let idx = LineIndex::new("hello\nworld\ntest".to_string());
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 5)); // 'o' before newline
        assert_eq!(idx.offset_to_position(6), Position::new(1, 0)); // 'w'
        assert_eq!(idx.offset_to_position(11), Position::new(1, 5)); // 'd' before newline
        assert_eq!(idx.offset_to_position(12), Position::new(2, 0)); // 't'
    }

    #[test]
    fn position_to_offset_multi_line() {
        let idx = LineIndex::new("hello\nworld".to_string());
        assert_eq!(idx.position_to_offset(Position::new(0, 0)), Some(0));
        assert_eq!(idx.position_to_offset(Position::new(0, 5)), Some(5));
        assert_eq!(idx.position_to_offset(Position::new(1, 0)), Some(6));
        assert_eq!(idx.position_to_offset(Position::new(1, 5)), Some(11));
    }

    #[test]
    fn utf16_handling() {
        // '😀' is 4 bytes in UTF-8 but 2 code units in UTF-16
        let idx = LineIndex::new("a😀b".to_string());
        assert_eq!(idx.offset_to_position(1), Position::new(0, 1));
        // 'b' is at byte 5, col 3 (1 + 2 for emoji)
        assert_eq!(idx.offset_to_position(5), Position::new(0, 3));
        assert_eq!(idx.position_to_offset(Position::new(0, 3)), Some(5));
    }

    #[test]
    fn out_of_bounds() {
        let idx = LineIndex::new("hello".to_string());
        assert_eq!(idx.position_to_offset(Position::new(5, 0)), None);
    }

    #[test]
    fn line_lookup() {
        let idx = LineIndex::new("a=1\nb=2\n".to_string());
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.line_of_offset(0), 0);
        assert_eq!(idx.line_of_offset(3), 0); // the newline belongs to its line
        assert_eq!(idx.line_of_offset(4), 1);
        assert_eq!(idx.line_of_offset(8), 2);
        assert_eq!(idx.line_of_offset(100), 2);
        assert_eq!(idx.line_range(1), 4..8);
        assert_eq!(idx.line_text(1), "b=2");
        assert_eq!(idx.line_text(2), "");
    }

    #[test]
    fn crlf_is_not_part_of_line_text() {
        let idx = LineIndex::new("a=1\r\nb=2".to_string());
        assert_eq!(idx.line_text(0), "a=1");
        assert_eq!(idx.line_text(1), "b=2");
    }

    #[test]
    fn replace_updates_lines() {
        let mut idx = LineIndex::new("a=1\nb=2".to_string());
        idx.replace_range(3..3, "\nc=3").unwrap();
        assert_eq!(idx.source(), "a=1\nc=3\nb=2");
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.line_text(1), "c=3");

        idx.replace_range(1..9, "").unwrap();
        assert_eq!(idx.source(), "a=2");
        assert_eq!(idx.line_count(), 1);
    }

    #[test]
    fn replace_rejects_bad_ranges() {
        let mut idx = LineIndex::new("é".to_string());
        assert!(idx.replace_range(1..1, "x").is_err());
        assert!(idx.replace_range(0..5, "").is_err());
        assert_eq!(idx.source(), "é");
    }

    #[test]
    fn range_round_trip() {
        let idx = LineIndex::new("hello\nworld".to_string());
        let range = idx.span_to_range(&(6..11));
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 5));
        assert_eq!(idx.range_to_span(range), Some(6..11));
    }
}
