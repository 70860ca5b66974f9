//! Per-document token cache with incremental repair
//!
//! Tokens are kept per line, keyed by document identity and version. An edit
//! batch is merged into one contiguous old-range; only the lines now occupying
//! that region are reclassified (reusing tokens whose text did not change),
//! and the untouched tail is relabeled by the line delta. Entries are replaced
//! wholesale on update, so a reader holding a previous snapshot still sees a
//! consistent, if stale, view.
//!
//! Contract: after any `update`, assembling the cache equals classifying the
//! whole post-edit document from scratch. Any detected inconsistency falls
//! back to a full rebuild; nothing here returns an error.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::classify::classify;
use crate::document::{LineEdit, LineSource};
use crate::token::LineToken;

#[derive(Debug)]
struct CacheEntry {
    version: i32,
    line_count: usize,
    per_line: BTreeMap<usize, LineToken>,
}

impl CacheEntry {
    fn assemble(&self) -> Vec<LineToken> {
        self.per_line.values().cloned().collect()
    }
}

/// Process-wide token cache, one entry per open document
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: HashMap<String, Arc<CacheEntry>>,
}

impl TokenCache {
    pub fn new() -> Self {
        TokenCache::default()
    }

    /// Tokens for the document, classifying every line on a version miss
    pub fn tokens(&mut self, doc: &impl LineSource) -> Vec<LineToken> {
        if let Some(entry) = self.entries.get(doc.uri()) {
            if entry.version == doc.version() && entry.line_count == doc.line_count() {
                return entry.assemble();
            }
        }
        self.rebuild(doc)
    }

    /// Repair the cache after an edit batch and return the full token stream
    ///
    /// `edits` describe replaced line ranges of the pre-edit document; `doc`
    /// is the post-edit document. A missing or inconsistent entry degrades to
    /// a full rebuild.
    pub fn update(&mut self, doc: &impl LineSource, edits: &[LineEdit]) -> Vec<LineToken> {
        let Some(entry) = self.entries.get(doc.uri()).cloned() else {
            return self.rebuild(doc);
        };
        if edits.is_empty() {
            return self.tokens(doc);
        }

        // Merge the batch into the minimal contiguous old-range: one composite
        // reparse region instead of bookkeeping many disjoint gaps
        let old_start = edits.iter().map(|e| e.start_line).min().unwrap_or(0);
        let old_end = edits
            .iter()
            .map(|e| e.end_line)
            .max()
            .unwrap_or(0)
            .min(entry.line_count.saturating_sub(1))
            .max(old_start);

        let delta = doc.line_count() as isize - entry.line_count as isize;
        // The new region spans as many lines as the old one did, plus the
        // whole-document delta; it can be empty when lines were only removed
        let new_region_end = old_end as isize + delta;

        let mut per_line = BTreeMap::new();

        // Untouched head
        for (&line, token) in entry.per_line.range(..old_start) {
            per_line.insert(line, token.clone());
        }

        // Reclassify the edited region, reusing byte-identical lines
        if new_region_end >= old_start as isize {
            let stop = (new_region_end as usize).min(doc.line_count().saturating_sub(1));
            for line in old_start..=stop {
                let text = doc.line(line);
                let token = match entry.per_line.get(&line) {
                    Some(old) if old.raw == text => old.clone(),
                    _ => classify(text, line),
                };
                per_line.insert(line, token);
            }
        }

        // Relabel the tail without reclassifying. Batches arrive with later
        // edits in post-edit coordinates of earlier ones, so the merged range
        // can miss a line; the raw-text check catches that and reclassifies.
        for (&line, token) in entry.per_line.range(old_end + 1..) {
            let shifted = line as isize + delta;
            if shifted >= 0 && (shifted as usize) < doc.line_count() {
                let shifted = shifted as usize;
                let text = doc.line(shifted);
                let token = if token.raw == text {
                    token.relabeled(shifted)
                } else {
                    classify(text, shifted)
                };
                per_line.insert(shifted, token);
            }
        }

        if per_line.len() != doc.line_count() {
            return self.rebuild(doc);
        }

        let entry = Arc::new(CacheEntry {
            version: doc.version(),
            line_count: doc.line_count(),
            per_line,
        });
        let tokens = entry.assemble();
        self.entries.insert(doc.uri().to_string(), entry);
        tokens
    }

    /// Drop the entry for a closed document
    pub fn invalidate(&mut self, uri: &str) {
        self.entries.remove(uri);
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn rebuild(&mut self, doc: &impl LineSource) -> Vec<LineToken> {
        let per_line: BTreeMap<usize, LineToken> = (0..doc.line_count())
            .map(|line| (line, classify(doc.line(line), line)))
            .collect();
        let entry = Arc::new(CacheEntry {
            version: doc.version(),
            line_count: doc.line_count(),
            per_line,
        });
        let tokens = entry.assemble();
        self.entries.insert(doc.uri().to_string(), entry);
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Position, Range, TextBuffer};
    use crate::token::LineKind;
    use proptest::prelude::*;

    fn from_scratch(doc: &TextBuffer) -> Vec<LineToken> {
        (0..doc.line_count())
            .map(|line| classify(doc.line(line), line))
            .collect()
    }

    #[test]
    fn test_full_build_and_version_hit() {
        let doc = TextBuffer::new("file:///m.gms", 1, "SETS\n  i;\n");
        let mut cache = TokenCache::new();
        let first = cache.tokens(&doc);
        assert_eq!(first.len(), 3);
        // Second call with the same version assembles from cache
        assert_eq!(cache.tokens(&doc), first);
    }

    #[test]
    fn test_update_equals_reclassification() {
        let mut doc = TextBuffer::new("file:///m.gms", 1, "* S ---\nSETS\n  i;\nx = 1;");
        let mut cache = TokenCache::new();
        cache.tokens(&doc);

        let edit = doc.apply_change(
            Range::new(Position::new(2, 0), Position::new(2, 0)),
            "  j,\n",
        );
        doc.set_version(2);
        let updated = cache.update(&doc, &[edit]);
        assert_eq!(updated, from_scratch(&doc));
    }

    #[test]
    fn test_insertion_shifts_tail_without_reclassifying() {
        // Scenario: inserting a blank line after line 1 shifts tokens at
        // line >= 2 down by one; their classification is untouched
        let mut doc = TextBuffer::new(
            "file:///m.gms",
            1,
            "* Header ---\nSETS\n  i /1*3/\n  j /a,b/;\n* Footer ---",
        );
        let mut cache = TokenCache::new();
        let before = cache.tokens(&doc);

        let edit = doc.apply_change(
            Range::new(Position::new(1, 4), Position::new(1, 4)),
            "\n",
        );
        doc.set_version(2);
        let after = cache.update(&doc, &[edit]);

        assert_eq!(after.len(), before.len() + 1);
        for (old, new) in before[2..].iter().zip(&after[3..]) {
            assert_eq!(new.line, old.line + 1);
            assert_eq!(new.kind, old.kind);
            assert_eq!(new.raw, old.raw);
        }
        assert_eq!(after, from_scratch(&doc));
    }

    #[test]
    fn test_deletion_of_region() {
        let mut doc = TextBuffer::new("file:///m.gms", 1, "a\nb\nc\nd\ne");
        let mut cache = TokenCache::new();
        cache.tokens(&doc);

        let edit = doc.apply_change(
            Range::new(Position::new(1, 0), Position::new(3, 1)),
            "",
        );
        doc.set_version(2);
        assert_eq!(cache.update(&doc, &[edit]), from_scratch(&doc));
    }

    #[test]
    fn test_batched_edits_merge_into_one_region() {
        let mut doc = TextBuffer::new("file:///m.gms", 1, "one\ntwo\nthree\nfour\nfive");
        let mut cache = TokenCache::new();
        cache.tokens(&doc);

        let e1 = doc.apply_change(Range::new(Position::new(1, 0), Position::new(1, 3)), "SETS");
        let e2 = doc.apply_change(Range::new(Position::new(3, 0), Position::new(3, 4)), "  i;");
        doc.set_version(2);
        assert_eq!(cache.update(&doc, &[e1, e2]), from_scratch(&doc));
    }

    #[test]
    fn test_update_without_entry_rebuilds() {
        let doc = TextBuffer::new("file:///m.gms", 3, "SETS i;");
        let mut cache = TokenCache::new();
        let tokens = cache.update(&doc, &[LineEdit { start_line: 0, end_line: 0 }]);
        assert_eq!(tokens, from_scratch(&doc));
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let doc = TextBuffer::new("file:///m.gms", 1, "SETS i;");
        let mut cache = TokenCache::new();
        cache.tokens(&doc);
        cache.invalidate("file:///m.gms");
        // Still correct after invalidation
        assert_eq!(cache.tokens(&doc), from_scratch(&doc));
    }

    #[test]
    fn test_edit_turning_line_into_section() {
        let mut doc = TextBuffer::new("file:///m.gms", 1, "note\nSETS i;");
        let mut cache = TokenCache::new();
        cache.tokens(&doc);

        let edit = doc.apply_change(
            Range::new(Position::new(0, 0), Position::new(0, 4)),
            "* Part ---",
        );
        doc.set_version(2);
        let tokens = cache.update(&doc, &[edit]);
        assert!(matches!(tokens[0].kind, LineKind::Section { level: 1, .. }));
        assert_eq!(tokens, from_scratch(&doc));
    }

    proptest! {
        /// Cache consistency: any single range edit on any document repairs
        /// the cache to exactly the from-scratch classification
        #[test]
        fn prop_update_matches_rebuild(
            text in "[ -~\n]{0,200}",
            start_line in 0usize..8,
            start_col in 0usize..10,
            end_line in 0usize..8,
            end_col in 0usize..10,
            replacement in "[ -~\n]{0,40}",
        ) {
            let mut doc = TextBuffer::new("file:///p.gms", 1, &text);
            let mut cache = TokenCache::new();
            cache.tokens(&doc);

            let (start, end) = if (start_line, start_col) <= (end_line, end_col) {
                (Position::new(start_line, start_col), Position::new(end_line, end_col))
            } else {
                (Position::new(end_line, end_col), Position::new(start_line, start_col))
            };
            let edit = doc.apply_change(Range::new(start, end), &replacement);
            doc.set_version(2);

            let updated = cache.update(&doc, &[edit]);
            prop_assert_eq!(updated, from_scratch(&doc));
        }
    }
}
