use crate::error::{Error, Result};
use crate::fuzzy::DEFAULT_MAX_DISTANCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "pagewiki.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wiki: WikiConfig,
    pub search: SearchConfig,
    pub render: RenderConfig,
}

/// Where pages live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Page directories; `~` is expanded
    pub roots: Vec<PathBuf>,
    /// Glob patterns matched against entry names
    pub ignore: Vec<String>,
}

/// Name resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub recursive: bool,
    pub fuzzy: bool,
    pub max_distance: usize,
    pub max_suggestions: usize,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub color: bool,
    pub line_numbers: bool,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            ignore: vec!["*.pyc".to_string(), "*.swp".to_string()],
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            fuzzy: true,
            max_distance: DEFAULT_MAX_DISTANCE,
            max_suggestions: 5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color: true,
            line_numbers: false,
        }
    }
}

impl WikiConfig {
    /// Roots with a leading `~` replaced by the home directory
    pub fn expanded_roots(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|root| expand_home(root)).collect()
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<()> {
        if self.max_distance == 0 {
            return Err(Error::config_validation("max_distance must be at least 1"));
        }

        if self.max_distance > 10 {
            return Err(Error::config_validation("max_distance cannot exceed 10"));
        }

        Ok(())
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.search.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load config from file, or return defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, roots: Vec<PathBuf>, strict: bool, no_color: bool) {
        if !roots.is_empty() {
            self.wiki.roots = roots;
        }

        if strict {
            self.search.recursive = false;
            self.search.fuzzy = false;
        }

        if no_color {
            self.render.color = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.wiki.roots.is_empty() {
            return Err(Error::config_validation(
                "no wiki root configured (use --root or set wiki.roots)",
            ));
        }

        self.search.validate()
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
