//! Structural intelligence tests
//!
//! End-to-end checks from raw text to LSP folding ranges and symbols.

use super::folding::FoldingBuilder;
use super::symbols::SymbolBuilder;
use gamscope_core::{classify, CancelFlag, LineToken};
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind, SymbolKind};

use crate::config::{FoldingSettings, OutlineSettings};

fn tokenize(text: &str) -> Vec<LineToken> {
    text.lines()
        .enumerate()
        .map(|(i, line)| classify(line, i))
        .collect()
}

fn fold(text: &str) -> Vec<FoldingRange> {
    FoldingBuilder::generate(
        &tokenize(text),
        &CancelFlag::new(),
        &FoldingSettings::default(),
    )
}

fn symbols(text: &str) -> Vec<tower_lsp::lsp_types::DocumentSymbol> {
    SymbolBuilder::generate(
        &tokenize(text),
        &CancelFlag::new(),
        &OutlineSettings::default(),
    )
}

// ============================================================================
// FOLDING RANGE TESTS
// ============================================================================

#[test]
fn test_section_and_declaration_folds() {
    let text = "\
* Transport model ---
SETS
  i /seattle, sandiego/
  j /newyork, chicago/;
x = 1;";

    let ranges = fold(text);

    // The section spans the whole document, the declaration lines 1-3
    assert!(ranges.contains(&region(0, 4)));
    assert!(ranges.contains(&region(1, 3)));
}

#[test]
fn test_comment_block_hides_inner_declaration() {
    let ranges = fold("$ontext\nSETS i;\n$offtext");

    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].start_line, 0);
    assert_eq!(ranges[0].end_line, 2);
    assert_eq!(ranges[0].kind, Some(FoldingRangeKind::Comment));
}

#[test]
fn test_comment_folds_can_be_disabled() {
    let tokens = tokenize("$ontext\nnote\n$offtext\nSETS\n  i;");
    let ranges = FoldingBuilder::generate(
        &tokens,
        &CancelFlag::new(),
        &FoldingSettings {
            comment_blocks: false,
        },
    );
    assert!(ranges
        .iter()
        .all(|r| r.kind != Some(FoldingRangeKind::Comment)));
    assert!(ranges.iter().any(|r| r.start_line == 3));
}

#[test]
fn test_single_line_blocks_do_not_fold() {
    let ranges = fold("* Lone banner ---\n* Next banner ---");
    assert!(ranges.is_empty());
}

#[test]
fn test_empty_document() {
    assert!(fold("").is_empty());
    assert!(symbols("").is_empty());
}

// ============================================================================
// DOCUMENT SYMBOL TESTS
// ============================================================================

#[test]
fn test_outline_sections_declarations_and_items() {
    let text = "\
* Header ---
SETS
  i /1*3/
  j /a,b/;
* Footer ---";

    let roots = symbols(text);

    assert_eq!(roots.len(), 2);
    let header = &roots[0];
    assert_eq!(header.name, "Header");
    assert_eq!(header.kind, SymbolKind::MODULE);
    assert_eq!(header.range.start.line, 0);
    assert_eq!(header.range.end.line, 3);

    let decls = header.children.as_ref().expect("header has a declaration");
    assert_eq!(decls.len(), 1);
    let sets = &decls[0];
    assert_eq!(sets.name, "SETS");
    assert_eq!(sets.kind, SymbolKind::ARRAY);
    assert_eq!(sets.range.start.line, 1);
    assert_eq!(sets.range.end.line, 3);

    let items = sets.children.as_ref().expect("declaration has items");
    let names: Vec<&str> = items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["i", "j"]);

    let footer = &roots[1];
    assert_eq!(footer.name, "Footer");
    assert!(footer.children.is_none());
}

#[test]
fn test_declaration_kinds_map_to_symbol_kinds() {
    let text = "\
sets s;
parameters p;
variables v;
equations e;
model m /all/;
acronym a;
file f;
function fn;";

    let roots = symbols(text);
    let kinds: Vec<SymbolKind> = roots.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SymbolKind::ARRAY,
            SymbolKind::TYPE_PARAMETER,
            SymbolKind::VARIABLE,
            SymbolKind::INTERFACE,
            SymbolKind::CLASS,
            SymbolKind::ENUM,
            SymbolKind::FILE,
            SymbolKind::FUNCTION,
        ]
    );
}

#[test]
fn test_deep_section_before_shallow_is_root() {
    let roots = symbols("** Orphan ---\nx = 1;");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name, "Orphan");
    assert_eq!(roots[0].kind, SymbolKind::NAMESPACE);
}

#[test]
fn test_item_details_carry_descriptions() {
    let roots = symbols("PARAMETERS\n  c(i,j) 'transport cost';\n* End ---");
    let items = roots[0].children.as_ref().expect("items");
    assert_eq!(items[0].name, "c");
    assert_eq!(items[0].detail.as_deref(), Some("transport cost"));
}

#[test]
fn test_items_can_be_disabled() {
    let tokens = tokenize("SETS\n  i, j;\n* End ---");
    let roots = SymbolBuilder::generate(
        &tokens,
        &CancelFlag::new(),
        &OutlineSettings {
            declaration_items: false,
        },
    );
    assert_eq!(roots[0].name, "SETS");
    assert!(roots[0].children.is_none());
}

#[test]
fn test_unterminated_declaration_reaches_document_end() {
    let roots = symbols("VARIABLES\n  x\n  z");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].kind, SymbolKind::VARIABLE);
    assert_eq!(roots[0].range.end.line, 2);
}

#[test]
fn test_selection_range_covers_keyword() {
    let roots = symbols("  positive variables x;\n* End ---");
    let sel = roots[0].selection_range;
    assert_eq!(sel.start.line, 0);
    assert_eq!(sel.start.character, 2);
    assert_eq!(sel.end.character, 2 + "positive variables".len() as u32);
}

#[test]
fn test_cancellation_yields_empty_results() {
    let tokens = tokenize("* S ---\nSETS i;");
    let cancel = CancelFlag::new();
    cancel.cancel();
    assert!(FoldingBuilder::generate(&tokens, &cancel, &FoldingSettings::default()).is_empty());
    assert!(SymbolBuilder::generate(&tokens, &cancel, &OutlineSettings::default()).is_empty());
}

fn region(start_line: u32, end_line: u32) -> FoldingRange {
    FoldingRange {
        start_line,
        end_line,
        kind: Some(FoldingRangeKind::Region),
        start_character: None,
        end_character: None,
        collapsed_text: None,
    }
}
