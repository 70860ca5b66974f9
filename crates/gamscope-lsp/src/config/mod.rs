//! Configuration engine
//!
//! Settings are loaded from `gamscope.toml` in the workspace root:
//!
//! ```toml
//! [outline]
//! declaration_items = true
//!
//! [folding]
//! comment_blocks = true
//! ```
//!
//! Every field has a default; a missing file or missing section means
//! defaults, and only malformed TOML is reported as an error.

mod settings;


pub use settings::{ConfigError, FoldingSettings, OutlineSettings, Settings};

/// Configuration file name looked up in the workspace root
pub const CONFIG_FILE: &str = "gamscope.toml";
