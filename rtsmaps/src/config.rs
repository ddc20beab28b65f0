//! Configuration file support

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Description used when a scenario does not name one
pub const DEFAULT_DESCRIPTION: &str = "Destroy all enemy buildings.";

/// Extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Game installation to read
    pub game_directory: Option<PathBuf>,

    /// Extra directories scanned for loose scenario files
    pub map_directories: Vec<PathBuf>,

    /// Fallback scenario description
    pub default_description: String,

    /// Fill terrain that is shorter than width * height with tile 0
    pub pad_short_terrain: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            game_directory: None,
            map_directories: Vec::new(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
            pad_short_terrain: true,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from the default location, or defaults if there
    /// is no file
    pub fn load() -> Result<Self> {
        match default_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: ExtractConfig = toml::from_str(&contents)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// `~/.rtsmaps/config.toml`, falling back to `~/.config/rtsmaps/config.toml`
pub fn default_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;

    let dotted = home.join(".rtsmaps").join("config.toml");
    if dotted.exists() {
        return Some(dotted);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| home.join(".config"))
        .join("rtsmaps")
        .join("config.toml");
    config_dir.exists().then_some(config_dir)
}
