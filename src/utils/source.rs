//! Mapping byte spans back to human-readable source positions
//!
//! Diagnostics carry character-offset spans; presentation needs
//! `Line N, col M`. The map is built once per source text and looked up
//! per diagnostic.

use crate::utils::Span;

/// Precomputed table of line start offsets for one source text
pub struct SourceMap {
    line_starts: Vec<usize>,
}

/// A 1-based line/column position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.chars().enumerate() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Resolve the start of a span to a line/column pair
    pub fn location(&self, span: Span) -> Location {
        let line = self
            .line_starts
            .partition_point(|&start| start <= span.start);
        let column = span.start - self.line_starts[line - 1] + 1;
        Location { line, column }
    }

    /// Format the standard diagnostic prefix for a span
    pub fn describe(&self, span: Span) -> String {
        let loc = self.location(span);
        format!("Line {}, col {}", loc.line, loc.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        let map = SourceMap::new("let x = 1;");
        assert_eq!(map.location(Span::new(4, 5)), Location { line: 1, column: 5 });
    }

    #[test]
    fn test_later_lines() {
        let map = SourceMap::new("print(1);\nprint(2);\nbreak;");
        assert_eq!(map.describe(Span::new(10, 15)), "Line 2, col 1");
        assert_eq!(map.describe(Span::new(20, 25)), "Line 3, col 1");
    }

    #[test]
    fn test_offset_at_line_start() {
        let map = SourceMap::new("a\nb\n");
        assert_eq!(map.location(Span::new(2, 3)), Location { line: 2, column: 1 });
    }
}
