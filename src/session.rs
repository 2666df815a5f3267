//! Locally persisted "remembered user" key.
//!
//! Holds the email of the last signed-in user so a returning user skips the
//! landing view. The identity provider stays authoritative.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LocalState {
    path: PathBuf,
}

impl LocalState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The remembered email. A missing or unreadable file means none.
    pub fn remembered_email(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let state: StoredState = serde_json::from_str(&content).ok()?;
        state.email.filter(|e| !e.is_empty())
    }

    pub fn remember(&self, email: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = StoredState {
            email: Some(email.to_string()),
        };
        std::fs::write(&self.path, serde_json::to_string(&state)?)?;
        Ok(())
    }

    pub fn forget(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remember_and_forget() {
        let temp = TempDir::new().unwrap();
        let state = LocalState::new(temp.path().join("nested").join("local.json"));

        assert!(state.remembered_email().is_none());

        state.remember("ada@example.com").unwrap();
        assert_eq!(state.remembered_email().as_deref(), Some("ada@example.com"));

        state.forget().unwrap();
        assert!(state.remembered_email().is_none());
        // Forgetting twice is fine
        state.forget().unwrap();
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("local.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(LocalState::new(path).remembered_email().is_none());
    }
}
