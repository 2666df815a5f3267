//! Identity provider contract and the bundled local provider.

use crate::error::AuthError;
use crate::types::UserProfile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<UserProfile, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in profile, if any.
    fn current(&self) -> Option<UserProfile>;

    /// Receiver that observes every session change.
    fn on_auth_state_changed(&self) -> watch::Receiver<Option<UserProfile>>;
}

/// Reject profiles that cannot act as a partition key.
pub fn validate_profile(profile: &UserProfile) -> Result<(), AuthError> {
    let email = profile.email.trim();
    if email.is_empty() {
        return Err(AuthError::InvalidProfile("email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidProfile(format!(
            "'{}' is not an email address",
            email
        )));
    }
    Ok(())
}

/// Provider that signs in with locally supplied credentials.
///
/// With a session file the active profile survives restarts, the way a
/// hosted provider keeps its session in browser storage.
pub struct LocalIdentityProvider {
    credentials: Option<UserProfile>,
    session_file: Option<PathBuf>,
    state: watch::Sender<Option<UserProfile>>,
}

impl LocalIdentityProvider {
    /// Provider with no persisted session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            credentials: None,
            session_file: None,
            state,
        }
    }

    /// Provider that restores and persists its session at `path`.
    pub fn with_session_file(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let restored = read_session(&path)?;
        if let Some(ref profile) = restored {
            debug!(email = %profile.email, "Restored session");
        }
        let (state, _) = watch::channel(restored);
        Ok(Self {
            credentials: None,
            session_file: Some(path),
            state,
        })
    }

    /// Credentials used by the next `sign_in`.
    pub fn with_credentials(mut self, profile: UserProfile) -> Self {
        self.credentials = Some(profile);
        self
    }

    /// Re-read the session file and publish the stored session if it no
    /// longer matches. Picks up a sign-in or sign-out done by another process.
    ///
    /// Returns true when the session changed.
    pub fn reload(&self) -> Result<bool, AuthError> {
        let Some(ref path) = self.session_file else {
            return Ok(false);
        };
        let stored = read_session(path)?;
        let changed = self.state.send_if_modified(|current| {
            if *current == stored {
                return false;
            }
            *current = stored;
            true
        });
        if changed {
            debug!(path = %path.display(), "Session changed on disk");
        }
        Ok(changed)
    }

    fn persist(&self, profile: Option<&UserProfile>) -> Result<(), AuthError> {
        let Some(ref path) = self.session_file else {
            return Ok(());
        };
        match profile {
            Some(profile) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, serde_json::to_string_pretty(profile)?)?;
            }
            None => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn read_session(path: &Path) -> Result<Option<UserProfile>, AuthError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let profile: UserProfile = serde_json::from_str(&content)?;
    Ok(Some(profile))
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self) -> Result<UserProfile, AuthError> {
        let profile = self.credentials.clone().ok_or(AuthError::NoCredentials)?;
        validate_profile(&profile)?;

        self.persist(Some(&profile))?;
        self.state.send_replace(Some(profile.clone()));
        info!(email = %profile.email, "Signed in");
        Ok(profile)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.persist(None)?;
        if let Some(previous) = self.state.send_replace(None) {
            info!(email = %previous.email, "Signed out");
        }
        Ok(())
    }

    fn current(&self) -> Option<UserProfile> {
        self.state.borrow().clone()
    }

    fn on_auth_state_changed(&self) -> watch::Receiver<Option<UserProfile>> {
        self.state.subscribe()
    }
}
