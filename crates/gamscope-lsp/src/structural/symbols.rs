//! Document symbol generation
//!
//! Maps the outline tree to a nested `DocumentSymbol` hierarchy. The kind
//! table is purely cosmetic decoration for the consumer; the structural
//! synonym collapse already happened in the classifier.

use gamscope_core::{self as core, CancelFlag, DeclKind, LineToken, OutlineKind, OutlineNode};
use tower_lsp::lsp_types::{DocumentSymbol, Position, Range, SymbolKind};

use crate::config::OutlineSettings;

/// Builder for the LSP document-symbol tree
pub struct SymbolBuilder;

impl SymbolBuilder {
    /// Generate the nested symbol tree for a token stream
    pub fn generate(
        tokens: &[LineToken],
        cancel: &CancelFlag,
        settings: &OutlineSettings,
    ) -> Vec<DocumentSymbol> {
        core::outline(tokens, cancel)
            .iter()
            .map(|node| Self::convert(node, settings))
            .collect()
    }

    fn convert(node: &OutlineNode, settings: &OutlineSettings) -> DocumentSymbol {
        let children: Vec<DocumentSymbol> = node
            .children
            .iter()
            .filter(|child| {
                settings.declaration_items || !matches!(child.kind, OutlineKind::Item(_))
            })
            .map(|child| Self::convert(child, settings))
            .collect();

        #[allow(deprecated)]
        DocumentSymbol {
            name: node.name.clone(),
            detail: node.detail.clone(),
            kind: Self::symbol_kind(&node.kind),
            tags: None,
            deprecated: None,
            range: Self::convert_range(node.range),
            selection_range: Self::convert_range(node.selection_range),
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        }
    }

    /// Presentation kind for an outline node
    pub fn symbol_kind(kind: &OutlineKind) -> SymbolKind {
        match kind {
            OutlineKind::Section { level: 1 } => SymbolKind::MODULE,
            OutlineKind::Section { level: 2 } => SymbolKind::NAMESPACE,
            OutlineKind::Section { level: 3 } => SymbolKind::CLASS,
            OutlineKind::Section { .. } => SymbolKind::STRUCT,
            OutlineKind::Declaration(base) | OutlineKind::Item(base) => Self::decl_kind(*base),
        }
    }

    fn decl_kind(base: DeclKind) -> SymbolKind {
        match base {
            DeclKind::Set => SymbolKind::ARRAY,
            DeclKind::Parameter => SymbolKind::TYPE_PARAMETER,
            DeclKind::Variable => SymbolKind::VARIABLE,
            DeclKind::Equation => SymbolKind::INTERFACE,
            DeclKind::Model => SymbolKind::CLASS,
            DeclKind::Acronym => SymbolKind::ENUM,
            DeclKind::File => SymbolKind::FILE,
            DeclKind::Function => SymbolKind::FUNCTION,
        }
    }

    fn convert_range(range: core::Range) -> Range {
        Range {
            start: Position {
                line: range.start.line as u32,
                character: range.start.character as u32,
            },
            end: Position {
                line: range.end.line as u32,
                character: range.end.character as u32,
            },
        }
    }
}
