//! Line-addressable document abstraction
//!
//! The analysis core never talks to an editor host directly; it consumes
//! anything that can hand out lines by index, plus a [`TextBuffer`] that owns
//! the text of an open document and applies incremental range edits.

use serde::{Deserialize, Serialize};

/// A position within a document, 0-based line and byte column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Position { line, character }
    }
}

/// A half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

/// An edit described against the pre-edit document: the old line range it
/// replaced. This is all the token cache needs to repair itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    /// First affected line of the old document
    pub start_line: usize,
    /// Last affected line of the old document, inclusive
    pub end_line: usize,
}

/// Read access to a versioned, line-addressable document
pub trait LineSource {
    /// Stable document identity
    fn uri(&self) -> &str;
    /// Version counter, strictly increasing on any edit
    fn version(&self) -> i32;
    /// Number of lines; an empty document has one empty line
    fn line_count(&self) -> usize;
    /// Text of the line at `index`, without its terminator
    fn line(&self, index: usize) -> &str;
}

/// Owned text of an open document, stored line by line
///
/// Incremental edits are applied with clamping: an out-of-bounds range is
/// pulled back inside the document rather than rejected, so there is no
/// failure path on malformed host input.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    uri: String,
    version: i32,
    lines: Vec<String>,
}

impl TextBuffer {
    /// Create a buffer from full document text
    pub fn new(uri: impl Into<String>, version: i32, text: &str) -> Self {
        TextBuffer {
            uri: uri.into(),
            version,
            lines: split_lines(text),
        }
    }

    /// Replace the entire content, e.g. on a full-sync change
    pub fn replace_all(&mut self, text: &str) {
        self.lines = split_lines(text);
    }

    /// Apply one incremental edit and report the replaced old line range
    pub fn apply_change(&mut self, range: Range, text: &str) -> LineEdit {
        let last = self.lines.len() - 1;
        let start_line = range.start.line.min(last);
        let end_line = range.end.line.clamp(start_line, last);

        let start_col = clamp_column(&self.lines[start_line], range.start.character);
        let end_col = clamp_column(&self.lines[end_line], range.end.character);

        let mut replacement = String::new();
        replacement.push_str(&self.lines[start_line][..start_col]);
        replacement.push_str(text);
        replacement.push_str(&self.lines[end_line][end_col..]);

        self.lines
            .splice(start_line..=end_line, split_lines(&replacement));

        LineEdit {
            start_line,
            end_line,
        }
    }

    /// Bump the document version
    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    /// Reassemble the full text
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl LineSource for TextBuffer {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Clamp a byte column into the line, snapping to a char boundary
fn clamp_column(line: &str, column: usize) -> usize {
    let mut col = column.min(line.len());
    while col > 0 && !line.is_char_boundary(col) {
        col -= 1;
    }
    col
}
