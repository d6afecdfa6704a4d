//! Configuration file support for mdpaste
//!
//! Reads from .mdpaste/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where images are stored
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Prompt defaults
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Asset directory settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// Directory for saved images, relative to the document's directory.
    /// Always written with forward slashes.
    /// Default: "assets/images"
    #[serde(default = "default_asset_dir")]
    pub dir: String,
}

/// Prompt-related configuration
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    /// Placeholder shown in the alt text prompt.
    /// Default: "Image description"
    #[serde(default)]
    pub default_alt_text: Option<String>,
}

pub const DEFAULT_ASSET_DIR: &str = "assets/images";

fn default_asset_dir() -> String {
    DEFAULT_ASSET_DIR.to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_asset_dir(),
        }
    }
}

impl Config {
    /// Load config from the nearest .mdpaste/config.toml above `start`.
    /// Returns default config if no file is found or it doesn't parse.
    pub fn load(start: &Path) -> Self {
        if let Some(path) = Self::find_config_path(start) {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "ignoring invalid config"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read config");
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path(start: &Path) -> Option<PathBuf> {
        let mut dir = start;

        loop {
            let config_path = dir.join(".mdpaste").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Asset directory split into path segments, empty segments dropped
    pub fn asset_dir_segments(&self) -> Vec<&str> {
        self.assets
            .dir
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .collect()
    }
}
