//! Structural intelligence
//!
//! Converts the analysis core's block hierarchy into LSP shapes:
//! - folding ranges for sections, declaration blocks and block comments
//! - a nested document-symbol tree for the outline view

pub mod folding;
pub mod symbols;

pub use folding::FoldingBuilder;
pub use symbols::SymbolBuilder;

#[cfg(test)]
mod tests;
