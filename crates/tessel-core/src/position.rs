//! Source positions and the offset → row/column index.
//!
//! The engine works on byte offsets internally. Positions handed to clients
//! carry all three coordinates so a renderer can pick whichever it needs:
//! - `row` is 1-based
//! - `column` is 1-based and counted in chars, not bytes
//! - `offset` is the 0-based byte offset into the source

use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// A point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(row: usize, column: usize, offset: usize) -> Self {
        Self {
            row,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A start/end pair of positions. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Empty span at a single point.
    pub fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Byte range covered by the span.
    pub fn range(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Whether the span crosses a line break.
    pub fn is_multiline(&self) -> bool {
        self.start.row != self.end.row
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Fast conversion from byte offsets to row/column positions.
#[derive(Debug, Clone)]
pub struct SourceMap<'s> {
    source: &'s str,
    /// Byte offsets where each line starts.
    line_starts: Vec<usize>,
}

impl<'s> SourceMap<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Convert a byte offset to a position. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = self.clamp(offset);
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);
        let line_start = self.line_starts[line];
        let column = self.source[line_start..offset].chars().count() + 1;
        Position::new(line + 1, column, offset)
    }

    /// Span between two byte offsets.
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.position(start), self.position(end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based row, without its line terminator.
    pub fn line(&self, row: usize) -> Option<&'s str> {
        let start = *self.line_starts.get(row.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(row)
            .map_or(self.source.len(), |&next| next - 1);
        let line = &self.source[start..end];
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Snap an offset down to the closest char boundary inside the source.
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
