//! Text cache configuration (ramses_text.toml)

use crate::page::QuadSize;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of the font registry and text cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextConfig {
    /// Width of every atlas page in pixels
    #[serde(default = "default_page_extent")]
    pub atlas_page_width: u32,
    /// Height of every atlas page in pixels
    #[serde(default = "default_page_extent")]
    pub atlas_page_height: u32,
    /// Rasterized bitmaps kept per font instance
    #[serde(default = "default_bitmap_cache_capacity")]
    pub bitmap_cache_capacity: usize,
}

fn default_page_extent() -> u32 {
    1024
}

fn default_bitmap_cache_capacity() -> usize {
    4096
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            atlas_page_width: default_page_extent(),
            atlas_page_height: default_page_extent(),
            bitmap_cache_capacity: default_bitmap_cache_capacity(),
        }
    }
}

impl TextConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TextConfig = toml::from_str(content)?;
        if config.atlas_page_width == 0 || config.atlas_page_height == 0 {
            anyhow::bail!(
                "atlas page size {}x{} is empty",
                config.atlas_page_width,
                config.atlas_page_height
            );
        }
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn atlas_page_size(&self) -> QuadSize {
        QuadSize::new(self.atlas_page_width, self.atlas_page_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = TextConfig::from_toml("").unwrap();
        assert_eq!(config, TextConfig::default());
        assert_eq!(config.atlas_page_size(), QuadSize::new(1024, 1024));
    }

    #[test]
    fn test_partial_override() {
        let config = TextConfig::from_toml("atlas_page_width = 256").unwrap();
        assert_eq!(config.atlas_page_width, 256);
        assert_eq!(config.atlas_page_height, 1024);
    }

    #[test]
    fn test_empty_page_rejected() {
        assert!(TextConfig::from_toml("atlas_page_height = 0").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TextConfig {
            atlas_page_width: 64,
            atlas_page_height: 32,
            bitmap_cache_capacity: 10,
        };
        let text = config.to_toml().unwrap();
        assert_eq!(TextConfig::from_toml(&text).unwrap(), config);
    }
}
