//! Server configuration.
//!
//! Configuration can come from a TOML file, from the command line, or
//! both; command-line values win. The page counts follow the deployment
//! convention of one count per supported size, smallest first.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ember_common::config::PageLayout;
use ember_common::constants::SUPPORTED_PAGE_SIZES;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the backing data file.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Path of the Unix socket to listen on.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    /// Number of 8 KB pages.
    #[serde(default)]
    pub pages_8k: usize,

    /// Number of 16 KB pages.
    #[serde(default)]
    pub pages_16k: usize,

    /// Number of 32 KB pages.
    #[serde(default)]
    pub pages_32k: usize,

    /// Number of 2 MB pages.
    #[serde(default)]
    pub pages_2m: usize,

    /// Serve uncached (the direct pool) instead of the LRU cache.
    #[serde(default)]
    pub direct: bool,

    /// Log level (error, warn, info, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            socket_path: None,
            pages_8k: 0,
            pages_16k: 0,
            pages_32k: 0,
            pages_2m: 0,
            direct: false,
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the page counts in ascending size order.
    pub fn page_counts(&self) -> [usize; 4] {
        [self.pages_8k, self.pages_16k, self.pages_32k, self.pages_2m]
    }

    /// Applies positional page counts, smallest size first.
    pub fn set_page_counts(&mut self, counts: &[usize]) {
        let mut iter = counts.iter().copied();
        self.pages_8k = iter.next().unwrap_or(0);
        self.pages_16k = iter.next().unwrap_or(0);
        self.pages_32k = iter.next().unwrap_or(0);
        self.pages_2m = iter.next().unwrap_or(0);
    }

    /// Builds the page layout from the configured counts.
    ///
    /// Zero counts contribute no pages; validation happens when the pool
    /// is constructed.
    pub fn layout(&self) -> PageLayout {
        PageLayout::from_ranges(
            SUPPORTED_PAGE_SIZES
                .iter()
                .copied()
                .zip(self.page_counts()),
        )
    }
}
