//! Folding range generation

use gamscope_core::{self as core, CancelFlag, LineToken};
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};

use crate::config::FoldingSettings;

/// Builder for LSP folding ranges
pub struct FoldingBuilder;

impl FoldingBuilder {
    /// Generate folding ranges for a token stream
    pub fn generate(
        tokens: &[LineToken],
        cancel: &CancelFlag,
        settings: &FoldingSettings,
    ) -> Vec<FoldingRange> {
        core::folding(tokens, cancel)
            .into_iter()
            .filter(|range| settings.comment_blocks || range.kind != core::FoldKind::Comment)
            .map(|range| FoldingRange {
                start_line: range.start_line as u32,
                end_line: range.end_line as u32,
                kind: Some(match range.kind {
                    core::FoldKind::Comment => FoldingRangeKind::Comment,
                    core::FoldKind::Region => FoldingRangeKind::Region,
                }),
                start_character: None,
                end_character: None,
                collapsed_text: None,
            })
            .collect()
    }
}
