//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! max_commands = 128000
//!
//! [atlas]
//! padding = 2
//! max_side = 8192
//! overhead = 1.3
//! cache_dir = "cache/textures"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::batch::DEFAULT_MAX_COMMANDS;

/// Default spacing between packed atlas regions, in pixels.
pub const DEFAULT_ATLAS_PADDING: u32 = 2;
/// Largest atlas side the packer may grow to.
pub const MAX_ATLAS_SIZE: u32 = 8192;
/// Slack applied to the summed asset area when estimating the first atlas side.
pub const DEFAULT_ATLAS_OVERHEAD: f64 = 1.3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Command pool capacity; a full pool flushes automatically.
    pub max_commands: usize,
    pub atlas: AtlasConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commands: DEFAULT_MAX_COMMANDS,
            atlas: AtlasConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub padding: u32,
    pub max_side: u32,
    pub overhead: f64,
    pub cache_dir: PathBuf,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_ATLAS_PADDING,
            max_side: MAX_ATLAS_SIZE,
            overhead: DEFAULT_ATLAS_OVERHEAD,
            cache_dir: PathBuf::from("cache/textures"),
        }
    }
}

impl AtlasConfig {
    /// Default settings writing the cache into `dir`.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self { cache_dir: dir.into(), ..Self::default() }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}
