//! Line token model
//!
//! One token per source line. Classification depends only on that line's
//! text, which is what makes tokens individually cacheable and replaceable
//! during incremental re-analysis.

use serde::{Deserialize, Serialize};

/// The analysis result for a single source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineToken {
    /// 0-based line index within the document
    pub line: usize,
    /// Original line text, untouched
    pub raw: String,
    /// Trimmed, inline-comment-stripped text
    pub processed: String,
    /// Structural role of the line
    pub kind: LineKind,
}

/// Structural role of a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LineKind {
    /// `$ontext` block comment opener
    BlockCommentStart,
    /// `$offtext` block comment closer
    BlockCommentEnd,
    /// Comment-based section banner: `*** Title ---`
    Section {
        /// Count of leading `*` markers (nesting depth, >= 1)
        level: usize,
        /// Trimmed banner title, `(empty)` when blank
        title: String,
    },
    /// Line opening a typed declaration block
    Declaration {
        /// Full matched keyword text, e.g. `positive variables`
        full: String,
        /// Canonical category after synonym collapse
        base: DeclKind,
        /// Byte offset of the matched keyword within `processed`
        keyword_index: usize,
        /// Byte length of the trimmed matched keyword
        keyword_len: usize,
    },
    /// Anything else, including blank and pure data lines
    Normal,
}

impl LineToken {
    /// Shift the token to a new line index without reclassifying
    pub(crate) fn relabeled(&self, line: usize) -> LineToken {
        let mut token = self.clone();
        token.line = line;
        token
    }
}

/// Canonical declaration category
///
/// Synonyms are collapsed structurally: every variable-type modifier maps to
/// [`DeclKind::Variable`], `scalar`/`table` to [`DeclKind::Parameter`] and
/// `alias` to [`DeclKind::Set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Set,
    Parameter,
    Variable,
    Equation,
    Model,
    Acronym,
    File,
    Function,
}

impl DeclKind {
    /// Canonical uppercase keyword name
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Set => "SET",
            DeclKind::Parameter => "PARAMETER",
            DeclKind::Variable => "VARIABLE",
            DeclKind::Equation => "EQUATION",
            DeclKind::Model => "MODEL",
            DeclKind::Acronym => "ACRONYM",
            DeclKind::File => "FILE",
            DeclKind::Function => "FUNCTION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relabel_keeps_classification() {
        let token = LineToken {
            line: 3,
            raw: "SETS".to_string(),
            processed: "SETS".to_string(),
            kind: LineKind::Declaration {
                full: "SETS".to_string(),
                base: DeclKind::Set,
                keyword_index: 0,
                keyword_len: 4,
            },
        };
        let shifted = token.relabeled(7);
        assert_eq!(shifted.line, 7);
        assert_eq!(shifted.kind, token.kind);
        assert_eq!(shifted.raw, token.raw);
    }

    #[test]
    fn test_token_serialization_round_trip() {
        let token = LineToken {
            line: 0,
            raw: "* Intro ---".to_string(),
            processed: "* Intro ---".to_string(),
            kind: LineKind::Section {
                level: 1,
                title: "Intro".to_string(),
            },
        };
        let json = serde_json::to_string(&token).unwrap();
        let back: LineToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
