//! Configuration system.
//!
//! Consolidates configuration from three tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/taskify/config.yaml`
//! 3. **User** - `~/.taskify/config.yaml`
//!
//! ## Environment Variables
//! - `TASKIFY_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TASKIFY_DB_PATH` - Database path
//! - `TASKIFY_STATE_DIR` - Session and local state directory
//! - `TASKIFY_USER_DIR` - User config dir (default: `~/.taskify`)
//! - `TASKIFY_PROJECT_DIR` - Project config dir (default: `./taskify`)

mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, deep_merge};
pub use types::*;
