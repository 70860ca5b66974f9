//! gamscope-core - structural analysis for GAMS model sources
//!
//! This crate turns raw source text into an outline tree and folding ranges:
//! - [`classify`](classify::classify) maps each line to exactly one token
//! - [`TokenCache`](cache::TokenCache) repairs per-line tokens incrementally
//!   on every edit instead of reclassifying whole documents
//! - [`hierarchy`] rebuilds nested block structure (sections, declarations,
//!   block comments) with an explicit open-block stack and projects it as an
//!   outline tree or flat folding extents
//!
//! Everything here is host-agnostic and synchronous; malformed input is
//! always resolved by a defined fallback, never by an error. The only
//! propagated condition is cooperative cancellation.

pub mod cache;
pub mod cancel;
pub mod classify;
pub mod document;
pub mod hierarchy;
pub mod items;
pub mod token;

pub use cache::TokenCache;
pub use cancel::CancelFlag;
pub use classify::classify;
pub use document::{LineEdit, LineSource, Position, Range, TextBuffer};
pub use hierarchy::{folding, outline, FoldKind, FoldRange, OutlineKind, OutlineNode};
pub use token::{DeclKind, LineKind, LineToken};
