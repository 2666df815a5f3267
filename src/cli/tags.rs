//! `tags` subcommand and the tags a user added beyond the configured defaults.

use crate::app::{Action, App};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tasks::run_action;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTags {
    tags: Vec<String>,
}

/// User-added tags, kept next to the session state so they outlive one invocation.
#[derive(Debug, Clone)]
pub struct CustomTags {
    path: PathBuf,
}

impl CustomTags {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Saved tags. A missing or unreadable file means none.
    pub fn load(&self) -> Vec<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<StoredTags>(&content).ok())
            .map(|stored| stored.tags)
            .unwrap_or_default()
    }

    pub fn save(&self, tags: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredTags {
            tags: tags.to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

/// Defaults followed by saved tags, without duplicates.
pub fn known_tags(defaults: Vec<String>, custom: &CustomTags) -> Vec<String> {
    let mut tags = defaults;
    for tag in custom.load() {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
    tags
}

pub fn list(app: &App) {
    for tag in app.manager().tags() {
        println!("{}", tag);
    }
}

/// Add through the manager so its validation applies, then persist.
pub async fn add(app: &mut App, custom: &CustomTags, defaults: &[String], name: &str) -> Result<()> {
    run_action(app, Action::AddTag(name.to_string())).await?;

    let added: Vec<String> = app
        .manager()
        .tags()
        .iter()
        .filter(|t| !defaults.contains(t))
        .cloned()
        .collect();
    custom.save(&added)?;
    println!("Added tag: {}", name.trim());
    Ok(())
}
