//! Configuration loader with tier-based merging.
//!
//! Each tier's `config.yaml` is merged field-by-field over the tier below it.

use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `./taskify/config.yaml`
    Project = 1,
    /// `~/.taskify/config.yaml`
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let project_dir = std::env::var("TASKIFY_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskify")));

        let user_dir = std::env::var("TASKIFY_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskify")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            _ => None,
        };
        dir.map(|d| d.join("config.yaml"))
    }
}

/// Merge `overlay` into `base`. Objects merge per key; anything else replaces.
/// A null overlay leaves `base` untouched.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    ///
    /// `TASKIFY_CONFIG_PATH` names a single explicit file instead.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("TASKIFY_CONFIG_PATH").ok().map(PathBuf::from);
        Self::load_with(ConfigPaths::discover(), explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, explicit: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            let mut config = Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Self::apply_env_overrides(&mut config, &env);
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut merged = serde_json::to_value(Config::default())?;
        let mut config_path = None;

        for tier in [ConfigTier::Project, ConfigTier::User] {
            let Some(file) = paths.config_file(tier) else {
                continue;
            };
            if let Some(value) = read_yaml(&file) {
                debug!(tier = %tier, path = %file.display(), "Merging config");
                merged = deep_merge(merged, value);
                config_path = Some(file);
            }
        }

        let mut config: Config = serde_json::from_value(merged)?;
        Self::apply_env_overrides(&mut config, &env);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    fn apply_env_overrides<F>(config: &mut Config, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = env("TASKIFY_DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }

        if let Some(state_dir) = env("TASKIFY_STATE_DIR") {
            config.store.state_dir = PathBuf::from(state_dir);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Missing files are skipped silently; malformed ones with a warning.
fn read_yaml(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read config");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed config");
            None
        }
    }
}
