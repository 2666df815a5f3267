//! `signin`, `signout` and `whoami`.

use super::SigninArgs;
use crate::app::{App, View};
use crate::format::OutputFormat;
use crate::identity::{IdentityProvider, LocalIdentityProvider};
use crate::session::LocalState;
use crate::types::UserProfile;
use anyhow::Result;
use serde_json::json;
use tracing::warn;

impl SigninArgs {
    pub fn to_profile(&self) -> UserProfile {
        let mut profile = UserProfile::new(self.email.trim());
        if let Some(ref name) = self.name {
            profile = profile.with_display_name(name.trim());
        }
        if let Some(ref url) = self.photo_url {
            profile = profile.with_photo_url(url.trim());
        }
        profile
    }
}

/// Walk the landing and sign-in views, then attach to the new user.
pub async fn signin(
    app: &mut App,
    provider: LocalIdentityProvider,
    local_state: &LocalState,
    args: &SigninArgs,
) -> Result<()> {
    if app.view() == View::Tasks {
        app.on_auth_changed(None).await;
    }
    app.get_started();

    let provider = provider.with_credentials(args.to_profile());
    let profile = match provider.sign_in().await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "Sign-in failed");
            return Err(e.into());
        }
    };

    local_state.remember(&profile.email)?;
    app.on_auth_changed(Some(profile)).await;
    if let Some(notice) = app.notice() {
        warn!(notice, "Signed in but tasks failed to load");
    }

    println!(
        "{} ({} tasks)",
        app.greeting(),
        app.manager().tasks().len()
    );
    Ok(())
}

pub async fn signout(
    app: &mut App,
    provider: &LocalIdentityProvider,
    local_state: &LocalState,
) -> Result<()> {
    let email = provider.current().map(|p| p.email);
    provider.sign_out().await?;
    local_state.forget()?;
    app.on_auth_changed(None).await;

    match email {
        Some(email) => println!("Signed out {}", email),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub fn whoami(provider: &LocalIdentityProvider, format: OutputFormat) -> Result<()> {
    let profile = provider.current();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "user": profile }))?);
        }
        OutputFormat::Markdown => match profile {
            Some(profile) => {
                println!("# {}\n", profile.display_name.as_deref().unwrap_or(&profile.email));
                println!("- **email**: {}", profile.email);
                if let Some(ref url) = profile.photo_url {
                    println!("- **photo**: {}", url);
                }
            }
            None => println!("Not signed in"),
        },
    }
    Ok(())
}
