//! Configuration types and structures.

use crate::format::OutputFormat;
use crate::types::DEFAULT_TAGS;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where tasks and local session state live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory for the identity session and the remembered-user key.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskify/tasks.db")
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taskify"))
        .unwrap_or_else(|| PathBuf::from("taskify/state"))
}

/// Tags offered for assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsConfig {
    #[serde(default = "default_tags")]
    pub defaults: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            defaults: default_tags(),
        }
    }
}

fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

impl TagsConfig {
    /// Trimmed, non-empty, de-duplicated tag list.
    pub fn normalized(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in &self.defaults {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Default output format (markdown or json).
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// File holding the identity provider's active session.
    pub fn session_file(&self) -> PathBuf {
        self.store.state_dir.join("session.json")
    }

    /// File holding the remembered-user key.
    pub fn local_state_file(&self) -> PathBuf {
        self.store.state_dir.join("local.json")
    }

    /// File holding tags added with `tags add`.
    pub fn custom_tags_file(&self) -> PathBuf {
        self.store.state_dir.join("tags.json")
    }
}
