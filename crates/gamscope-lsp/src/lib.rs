//! gamscope Language Server Protocol implementation
//!
//! This library provides LSP support for GAMS model files, including:
//! - Folding ranges for comment blocks, section headers and declarations
//! - Document symbols for outline navigation
//! - Incremental text synchronization backed by a per-line token cache
//! - Workspace configuration from `gamscope.toml`
//!
//! # Library Usage
//!
//! ```ignore
//! use gamscope_lsp::run_server;
//!
//! // Run the LSP server over stdio
//! run_server().await;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Start the language server (typically called by an editor)
//! gamscope-lsp
//!
//! # With debug logging
//! RUST_LOG=debug gamscope-lsp
//! ```

pub mod config;
pub mod server;
pub mod structural;

// Re-export main entry point
pub use server::run_server;

// Re-export commonly used types
pub use config::Settings;
pub use structural::{FoldingBuilder, SymbolBuilder};
