//! Source positions attached to syntax nodes.
//!
//! Offsets are UTF-16 code units, lines are 1-based and columns are 0-based
//! UTF-16 code units from the start of the line.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

/// The source range of a node.
///
/// `start` and `end` are always recorded because the parser orders and reports
/// errors with them; they are only serialized, together with `loc`, when the
/// node was built with location tracking enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    /// Exclusive.
    pub end: u32,
    pub loc: Option<SourceLocation>,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            loc: None,
        }
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.loc {
            None => serializer.serialize_map(Some(0))?.end(),
            Some(loc) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("start", &self.start)?;
                map.serialize_entry("end", &self.end)?;
                map.serialize_entry("loc", loc)?;
                map.end()
            }
        }
    }
}

/// Line-start table built once over the source.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut offset: u32 = 0;
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            offset += c.len_utf16() as u32;
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                    }
                    line_starts.push(offset);
                }
                '\n' | '\u{2028}' | '\u{2029}' => line_starts.push(offset),
                _ => {}
            }
        }
        Self { line_starts }
    }

    pub fn position(&self, offset: u32) -> Position {
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));
        Position {
            line: line as u32 + 1,
            column: offset - self.line_starts[line],
        }
    }

    pub fn locate(&self, start: u32, end: u32) -> SourceLocation {
        SourceLocation {
            start: self.position(start),
            end: self.position(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_lines() {
        let index = LineIndex::new("ab\ncd\r\nef");
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
        assert_eq!(index.position(2), Position { line: 1, column: 2 });
        assert_eq!(index.position(3), Position { line: 2, column: 0 });
        assert_eq!(index.position(7), Position { line: 3, column: 0 });
    }

    #[test]
    fn unicode_line_separators_and_surrogates() {
        let index = LineIndex::new("\u{1F600}x\u{2028}y");
        // The emoji occupies two UTF-16 code units.
        assert_eq!(index.position(2), Position { line: 1, column: 2 });
        assert_eq!(index.position(4), Position { line: 2, column: 0 });
    }

    #[test]
    fn untracked_span_serializes_to_nothing() {
        let value = serde_json::to_value(Span::new(1, 4)).unwrap();
        assert_eq!(value, serde_json::json!({}));

        let index = LineIndex::new("let x");
        let span = Span {
            start: 4,
            end: 5,
            loc: Some(index.locate(4, 5)),
        };
        assert_eq!(
            serde_json::to_value(span).unwrap(),
            serde_json::json!({
                "start": 4,
                "end": 5,
                "loc": {"start": {"line": 1, "column": 4}, "end": {"line": 1, "column": 5}}
            })
        );
    }
}
