//! Declaration body item extraction
//!
//! Splits an accumulated declaration body into the individual declared
//! identifiers. This is a best-effort heuristic, not a grammar: identifiers
//! are captured with an optional parenthesized dimension list and an optional
//! quoted description, after the content of `/ ... /` data lists (which may
//! span lines) has been blanked out.

use regex::Regex;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One line's worth of declaration body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySegment {
    /// Origin line index
    pub line: usize,
    /// Processed text of the segment
    pub text: String,
    /// Byte column of the segment's start within the raw origin line
    pub col_offset: usize,
}

/// A single declared identifier, with a best-effort source range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclItem {
    /// Identifier name
    pub name: String,
    /// Quoted description text, if one followed the identifier
    pub detail: Option<String>,
    /// Origin line index
    pub line: usize,
    /// Byte column range of the item within its raw origin line
    pub col_start: usize,
    pub col_end: usize,
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // identifier, optional (dims), optional 'description' or "description"
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*(\([^)]*\))?\s*('[^']*'|"[^"]*")?"#).unwrap()
    })
}

/// Extract declared items from the accumulated body segments
pub fn extract_items(segments: &[BodySegment]) -> Vec<DeclItem> {
    let mut items = Vec::new();
    let mut in_slash = false;
    let mut quote: Option<char> = None;

    for segment in segments {
        let blanked = blank_data_lists(&segment.text, &mut in_slash, &mut quote);
        for caps in item_re().captures_iter(&blanked) {
            let Some(name) = caps.get(1) else { continue };
            let detail = caps
                .get(3)
                .map(|d| d.as_str().trim_matches(['\'', '"']).to_string());
            let end = caps
                .get(3)
                .or_else(|| caps.get(2))
                .map(|m| m.end())
                .unwrap_or(name.end());
            items.push(DeclItem {
                name: name.as_str().to_string(),
                detail,
                line: segment.line,
                col_start: segment.col_offset + name.start(),
                col_end: segment.col_offset + end,
            });
        }
    }
    items
}

/// Overwrite `/ ... /` data-list content with spaces, preserving byte offsets
/// so regex match positions stay valid as columns. Slash and quote state carry
/// across segments because data lists and descriptions can span lines.
fn blank_data_lists(text: &str, in_slash: &mut bool, quote: &mut Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match (*in_slash, *quote, ch) {
            // Slash state toggles only outside quoted text
            (false, None, '/') => {
                *in_slash = true;
                push_blank(&mut out, ch);
            }
            (true, None, '/') => {
                *in_slash = false;
                push_blank(&mut out, ch);
            }
            (true, ..) => push_blank(&mut out, ch),
            (false, None, '\'' | '"') => {
                *quote = Some(ch);
                out.push(ch);
            }
            (false, Some(open), _) if ch == open => {
                *quote = None;
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn push_blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}
