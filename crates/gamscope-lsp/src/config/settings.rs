//! Configuration settings
//!
//! Defines the structures deserialized from `gamscope.toml`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error raised while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Outline view settings
    pub outline: OutlineSettings,
    /// Folding view settings
    pub folding: FoldingSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_toml_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Outline (document symbol) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutlineSettings {
    /// Include the individual declared identifiers as children of their
    /// declaration block
    pub declaration_items: bool,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        OutlineSettings {
            declaration_items: true,
        }
    }
}

/// Folding range settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FoldingSettings {
    /// Emit folds for `$ontext`/`$offtext` comment blocks
    pub comment_blocks: bool,
}

impl Default for FoldingSettings {
    fn default() -> Self {
        FoldingSettings {
            comment_blocks: true,
        }
    }
}
