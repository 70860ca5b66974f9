//! Block hierarchy builder
//!
//! Reconstructs nested block structure from the ordered token stream with an
//! explicit open-block stack, in a single pass. The outline tree and the flat
//! folding ranges are two projections of the same walk.
//!
//! Stack discipline, per token:
//! - a block comment opens unconditionally and never closes what is already
//!   open; its `$offtext` pops until the matching comment, closing abandoned
//!   declarations and sections one line above itself
//! - a section closes any open declaration and every section of equal or
//!   deeper level, but never reaches past a comment-block boundary
//! - a declaration replaces a sibling declaration and nests inside sections
//! - a normal line feeds an open declaration's body; a trailing `;` closes it
//! - end of stream closes everything still open at the last document line

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::document::{Position, Range};
use crate::items::{extract_items, BodySegment, DeclItem};
use crate::token::{DeclKind, LineKind, LineToken};

/// Folding classification of a closed block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldKind {
    Region,
    Comment,
}

/// A foldable extent, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRange {
    pub start_line: usize,
    pub end_line: usize,
    pub kind: FoldKind,
}

/// A closed block with its nested children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub start_line: usize,
    pub end_line: usize,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// `$ontext` / `$offtext` pair
    Comment,
    /// Comment-based section banner
    Section { level: usize, title: String },
    /// Typed declaration block
    Declaration {
        base: DeclKind,
        keyword: String,
        /// Exact keyword range within the raw opening line
        selection: Range,
        items: Vec<DeclItem>,
    },
}

/// The reconstructed nesting of a whole document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockForest {
    pub roots: Vec<Block>,
}

/// A node of the outline tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub name: String,
    pub detail: Option<String>,
    pub kind: OutlineKind,
    /// Full extent of the block
    pub range: Range,
    /// The part to highlight when the node is selected
    pub selection_range: Range,
    pub children: Vec<OutlineNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlineKind {
    Section { level: usize },
    Declaration(DeclKind),
    /// A single declared identifier inside a declaration block
    Item(DeclKind),
}

/// Builder-internal open block; lives only during one pass
enum OpenBlock {
    Comment {
        start_line: usize,
        children: Vec<Block>,
    },
    Section {
        start_line: usize,
        level: usize,
        title: String,
        children: Vec<Block>,
    },
    Declaration {
        start_line: usize,
        base: DeclKind,
        keyword: String,
        selection: Range,
        body: Vec<BodySegment>,
        children: Vec<Block>,
    },
}

impl OpenBlock {
    fn close(self, end_line: usize) -> Block {
        match self {
            OpenBlock::Comment {
                start_line,
                children,
            } => Block {
                kind: BlockKind::Comment,
                start_line,
                end_line,
                children,
            },
            OpenBlock::Section {
                start_line,
                level,
                title,
                children,
            } => Block {
                kind: BlockKind::Section { level, title },
                start_line,
                end_line,
                children,
            },
            OpenBlock::Declaration {
                start_line,
                base,
                keyword,
                selection,
                body,
                children,
            } => Block {
                kind: BlockKind::Declaration {
                    base,
                    keyword,
                    selection,
                    items: extract_items(&body),
                },
                start_line,
                end_line,
                children,
            },
        }
    }
}

/// Build the block forest for a token stream
///
/// Returns an empty forest as soon as `cancel` is raised.
pub fn build(tokens: &[LineToken], cancel: &CancelFlag) -> BlockForest {
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut roots: Vec<Block> = Vec::new();

    for token in tokens {
        if cancel.is_cancelled() {
            return BlockForest::default();
        }
        match &token.kind {
            LineKind::BlockCommentStart => {
                stack.push(OpenBlock::Comment {
                    start_line: token.line,
                    children: Vec::new(),
                });
            }
            LineKind::BlockCommentEnd => {
                // Pop until the matching comment; blocks abandoned inside it
                // close one line above. An orphan `$offtext` drains the stack.
                while let Some(open) = stack.pop() {
                    if matches!(open, OpenBlock::Comment { .. }) {
                        let block = open.close(token.line);
                        attach(&mut stack, &mut roots, block);
                        break;
                    }
                    let block = open.close(token.line.saturating_sub(1));
                    attach(&mut stack, &mut roots, block);
                }
            }
            LineKind::Section { level, title } => {
                while closes_for_section(stack.last(), *level) {
                    let open = stack.pop().expect("checked by closes_for_section");
                    let block = open.close(token.line.saturating_sub(1));
                    attach(&mut stack, &mut roots, block);
                }
                stack.push(OpenBlock::Section {
                    start_line: token.line,
                    level: *level,
                    title: title.clone(),
                    children: Vec::new(),
                });
            }
            LineKind::Declaration {
                full,
                base,
                keyword_index,
                keyword_len,
            } => {
                // A sibling declaration replaces the previous one; sections
                // and comment blocks above it stay open
                if matches!(stack.last(), Some(OpenBlock::Declaration { .. })) {
                    let open = stack.pop().expect("just matched");
                    let block = open.close(token.line.saturating_sub(1));
                    attach(&mut stack, &mut roots, block);
                }
                let offset = processed_offset(token);
                let col = offset + keyword_index;
                let selection = Range::new(
                    Position::new(token.line, col.min(token.raw.len())),
                    Position::new(token.line, (col + keyword_len).min(token.raw.len())),
                );
                let mut body = Vec::new();
                // Whatever follows the keyword on this line starts the body
                let after = keyword_index + keyword_len;
                let rest = token.processed.get(after..).unwrap_or("");
                if !rest.trim().is_empty() {
                    body.push(BodySegment {
                        line: token.line,
                        text: rest.to_string(),
                        col_offset: offset + after,
                    });
                }
                stack.push(OpenBlock::Declaration {
                    start_line: token.line,
                    base: *base,
                    keyword: full.clone(),
                    selection,
                    body,
                    children: Vec::new(),
                });
            }
            LineKind::Normal => {
                if let Some(OpenBlock::Declaration { body, .. }) = stack.last_mut() {
                    if !token.processed.is_empty() {
                        body.push(BodySegment {
                            line: token.line,
                            text: token.processed.clone(),
                            col_offset: processed_offset(token),
                        });
                    }
                    if token.processed.ends_with(';') {
                        let open = stack.pop().expect("just matched");
                        let block = open.close(token.line);
                        attach(&mut stack, &mut roots, block);
                    }
                }
            }
        }
    }

    // Unterminated constructs close at the last document line
    let last_line = tokens.last().map(|t| t.line).unwrap_or(0);
    while let Some(open) = stack.pop() {
        let block = open.close(last_line);
        attach(&mut stack, &mut roots, block);
    }

    BlockForest { roots }
}

/// Outline projection: nested sections and declarations with item leaves
pub fn outline(tokens: &[LineToken], cancel: &CancelFlag) -> Vec<OutlineNode> {
    let forest = build(tokens, cancel);
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let line_len = |line: usize| {
        tokens
            .get(line)
            .filter(|t| t.line == line)
            .or_else(|| tokens.iter().find(|t| t.line == line))
            .map(|t| t.raw.len())
            .unwrap_or(0)
    };
    forest
        .roots
        .iter()
        .flat_map(|block| outline_nodes(block, &line_len))
        .collect()
}

/// Folding projection: one flat extent per closed multi-line block
pub fn folding(tokens: &[LineToken], cancel: &CancelFlag) -> Vec<FoldRange> {
    let forest = build(tokens, cancel);
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let mut ranges = Vec::new();
    for block in &forest.roots {
        collect_folds(block, &mut ranges);
    }
    ranges
}

fn collect_folds(block: &Block, out: &mut Vec<FoldRange>) {
    // Single-line blocks are not worth folding
    if block.end_line > block.start_line {
        out.push(FoldRange {
            start_line: block.start_line,
            end_line: block.end_line,
            kind: match block.kind {
                BlockKind::Comment => FoldKind::Comment,
                _ => FoldKind::Region,
            },
        });
    }
    for child in &block.children {
        collect_folds(child, out);
    }
}

fn outline_nodes(block: &Block, line_len: &dyn Fn(usize) -> usize) -> Vec<OutlineNode> {
    let range = Range::new(
        Position::new(block.start_line, 0),
        Position::new(block.end_line, line_len(block.end_line)),
    );
    match &block.kind {
        // Comment blocks are not outline nodes; anything opened inside one
        // surfaces at the comment's own level
        BlockKind::Comment => block
            .children
            .iter()
            .flat_map(|child| outline_nodes(child, line_len))
            .collect(),
        BlockKind::Section { level, title } => {
            let banner = Range::new(
                Position::new(block.start_line, 0),
                Position::new(block.start_line, line_len(block.start_line)),
            );
            vec![OutlineNode {
                name: title.clone(),
                detail: None,
                kind: OutlineKind::Section { level: *level },
                range,
                selection_range: banner,
                children: block
                    .children
                    .iter()
                    .flat_map(|child| outline_nodes(child, line_len))
                    .collect(),
            }]
        }
        BlockKind::Declaration {
            base,
            keyword,
            selection,
            items,
        } => {
            let mut children: Vec<OutlineNode> = items
                .iter()
                .map(|item| {
                    let span = Range::new(
                        Position::new(item.line, item.col_start),
                        Position::new(item.line, item.col_end),
                    );
                    OutlineNode {
                        name: item.name.clone(),
                        detail: item.detail.clone(),
                        kind: OutlineKind::Item(*base),
                        range: span,
                        selection_range: span,
                        children: Vec::new(),
                    }
                })
                .collect();
            children.extend(
                block
                    .children
                    .iter()
                    .flat_map(|child| outline_nodes(child, line_len)),
            );
            vec![OutlineNode {
                name: keyword.clone(),
                detail: None,
                kind: OutlineKind::Declaration(*base),
                range,
                selection_range: *selection,
                children,
            }]
        }
    }
}

fn closes_for_section(top: Option<&OpenBlock>, level: usize) -> bool {
    match top {
        Some(OpenBlock::Declaration { .. }) => true,
        Some(OpenBlock::Section {
            level: open_level, ..
        }) => *open_level >= level,
        _ => false,
    }
}

fn attach(stack: &mut [OpenBlock], roots: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        Some(OpenBlock::Comment { children, .. })
        | Some(OpenBlock::Section { children, .. })
        | Some(OpenBlock::Declaration { children, .. }) => children.push(block),
        None => roots.push(block),
    }
}

/// Byte offset of the processed text within the raw line
fn processed_offset(token: &LineToken) -> usize {
    if token.processed.is_empty() {
        return 0;
    }
    token.raw.find(&token.processed).unwrap_or(0)
}
