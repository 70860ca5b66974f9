//! Line classifier
//!
//! Maps one raw line of text to exactly one [`LineToken`], total for any
//! input and independent of every other line. Priority order resolves what a
//! line *is*; where it *belongs* is entirely the hierarchy builder's job.

use regex::Regex;
use std::sync::OnceLock;

use crate::token::{DeclKind, LineKind, LineToken};

/// Block comment markers, matched case-insensitively at trimmed line start
const BLOCK_COMMENT_START: &str = "$ontext";
const BLOCK_COMMENT_END: &str = "$offtext";

/// Single-line comment marker; also the section banner marker character
const COMMENT_MARKER: char = '*';

/// Placeholder title for a section banner with no text
pub const EMPTY_TITLE: &str = "(empty)";

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Leading run of markers as the level, lazy title, 3+ hyphen delimiter
    RE.get_or_init(|| Regex::new(r"^\s*(\*+)\s*(.*?)\s+-{3,}").unwrap())
}

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(ACRONYMS?|ALIAS(?:ES)?|EQUATIONS?|FILES?|FUNCTIONS?|MODELS?|PARAMETERS?|SCALARS?|(?:SINGLETON)?\s*SETS?|TABLES?|(?:FREE|POSITIVE|NONNEGATIVE|NEGATIVE|BINARY|INTEGER|SOS1|SOS2|SEMICONT|SEMIINT)?\s*VARIABLES?)\b",
        )
        .unwrap()
    })
}

/// Classify a single line of text
///
/// Never fails; a line that matches nothing is [`LineKind::Normal`]. Inline
/// comment stripping truncates at the first `*` outside a `/ ... /` data
/// list, even when the marker occurs inside a quoted description string.
pub fn classify(text: &str, line: usize) -> LineToken {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if lower.starts_with(BLOCK_COMMENT_START) {
        return token(line, text, trimmed, LineKind::BlockCommentStart);
    }
    if lower.starts_with(BLOCK_COMMENT_END) {
        return token(line, text, trimmed, LineKind::BlockCommentEnd);
    }

    // Strip end-of-line comments, unless the whole line is a comment: a
    // full-line comment is kept intact so it can still match a section banner.
    // A marker inside a `/ ... /` data list is data (`/1*3/`), not a comment.
    let processed = if trimmed.starts_with(COMMENT_MARKER) {
        trimmed
    } else {
        match comment_marker_index(trimmed) {
            Some(index) => trimmed[..index].trim(),
            None => trimmed,
        }
    };

    if processed.is_empty() {
        return token(line, text, processed, LineKind::Normal);
    }

    // Pattern matching runs on a dash-normalized copy; `processed` itself
    // keeps the original characters
    let normalized = normalize_dashes(processed);

    if let Some(caps) = section_re().captures(&normalized) {
        let level = caps[1].len();
        let title = caps[2].trim();
        let title = if title.is_empty() {
            EMPTY_TITLE.to_string()
        } else {
            title.to_string()
        };
        return token(line, text, processed, LineKind::Section { level, title });
    }

    if let Some(caps) = declaration_re().captures(&normalized) {
        let full = caps[1].trim().to_string();
        // Locate the keyword in the non-normalized text so downstream
        // consumers can highlight the exact original range
        let keyword_index = find_case_insensitive(processed, &full).unwrap_or(0);
        let keyword_len = full.len();
        let base = collapse_keyword(&full);
        return token(
            line,
            text,
            processed,
            LineKind::Declaration {
                full,
                base,
                keyword_index,
                keyword_len,
            },
        );
    }

    token(line, text, processed, LineKind::Normal)
}

fn token(line: usize, raw: &str, processed: &str, kind: LineKind) -> LineToken {
    LineToken {
        line,
        raw: raw.to_string(),
        processed: processed.to_string(),
        kind,
    }
}

/// Collapse a matched keyword to its canonical category
fn collapse_keyword(full: &str) -> DeclKind {
    let upper = full.to_uppercase();
    if upper.contains("VARIABLE") {
        DeclKind::Variable
    } else if upper.contains("EQUATION") {
        DeclKind::Equation
    } else if upper.contains("MODEL") {
        DeclKind::Model
    } else if upper.contains("PARAMETER") || upper.contains("SCALAR") || upper.contains("TABLE") {
        DeclKind::Parameter
    } else if upper.contains("SET") || upper.contains("ALIAS") {
        DeclKind::Set
    } else if upper.contains("ACRONYM") {
        DeclKind::Acronym
    } else if upper.contains("FILE") {
        DeclKind::File
    } else {
        DeclKind::Function
    }
}

/// Byte index of the first comment marker outside a `/ ... /` data list.
/// Slash context is tracked within this line only; a list left open by a
/// previous line is the item extractor's concern, not the classifier's.
fn comment_marker_index(text: &str) -> Option<usize> {
    let mut in_slash = false;
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match ch {
            // Quotes only matter for protecting a `/`; a marker inside a
            // quoted string still starts a comment (see the note on classify)
            '\'' | '"' if !in_slash => match quote {
                None => quote = Some(ch),
                Some(open) if open == ch => quote = None,
                Some(_) => {}
            },
            '/' if quote.is_none() => in_slash = !in_slash,
            COMMENT_MARKER if !in_slash => return Some(i),
            _ => {}
        }
    }
    None
}

/// Replace Unicode hyphen/dash/minus variants with ASCII `-` and drop
/// zero-width separators, so banners pasted from rich-text sources still match
fn normalize_dashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => {
                out.push('-')
            }
            '\u{200B}' | '\u{FEFF}' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Byte offset of `needle` within `haystack`, ignoring ASCII case
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    (0..=haystack.len() - needle.len()).find(|&start| {
        haystack[start..start + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}
