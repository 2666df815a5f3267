//! Taskify CLI
//!
//! Signs a user in against the local identity provider and runs one task
//! action per invocation against the SQLite-backed store.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskify::app::App;
use taskify::cli::tags::{self, CustomTags};
use taskify::cli::{Cli, Command, SubtaskCommand, TagsCommand, auth, tasks};
use taskify::clock::SystemClock;
use taskify::config::{ConfigLoader, ConfigPaths};
use taskify::format::OutputFormat;
use taskify::identity::{IdentityProvider, LocalIdentityProvider};
use taskify::logging::{self, LogTarget};
use taskify::manager::TaskListManager;
use taskify::session::LocalState;
use taskify::store::{DocumentStore, SqliteStore};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_with(
            ConfigPaths::discover(),
            Some(PathBuf::from(path)),
            |key| std::env::var(key).ok(),
        )?,
        None => ConfigLoader::load()?,
    };
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Loaded config");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.into();
    }
    let format: OutputFormat = cli.format.map(Into::into).unwrap_or(config.display.format);
    let config = loader.into_config();

    config.ensure_db_dir()?;
    info!("Database: {:?}", config.store.db_path);

    let store = Arc::new(SqliteStore::open(&config.store.db_path)?);
    let provider = LocalIdentityProvider::with_session_file(config.session_file())?;
    let local_state = LocalState::new(config.local_state_file());
    let custom_tags = CustomTags::new(config.custom_tags_file());
    let default_tags = config.tags.normalized();

    let manager = TaskListManager::new(
        Arc::clone(&store) as Arc<dyn DocumentStore>,
        Arc::new(SystemClock),
    )
    .with_tags(tags::known_tags(default_tags.clone(), &custom_tags));

    let remembered = local_state.remembered_email();
    let mut app = App::new(manager, remembered.as_deref());

    match &cli.command {
        Command::Signin(args) => {
            return auth::signin(&mut app, provider, &local_state, args).await;
        }
        Command::Signout => {
            return auth::signout(&mut app, &provider, &local_state).await;
        }
        Command::Whoami => return auth::whoami(&provider, format),
        _ => {}
    }

    // The provider's session overrides the remembered email.
    app.on_auth_changed(provider.current()).await;
    tasks::require_tasks_view(&app)?;

    match cli.command {
        Command::Add { text } => tasks::add(&mut app, &text).await,
        Command::List(args) => {
            app.filter = args.to_filter()?;
            println!("{}", tasks::render_list(&app, format));
            Ok(())
        }
        Command::Done { id } => tasks::done(&mut app, &id).await,
        Command::Priority { id } => tasks::priority(&mut app, &id).await,
        Command::Tag { id, tag } => tasks::tag(&mut app, &id, tag).await,
        Command::Due { id, date } => tasks::due(&mut app, &id, date.as_deref()).await,
        Command::Track { id } => tasks::track(&mut app, &id).await,
        Command::Subtask(SubtaskCommand::Add { id, text }) => {
            tasks::subtask_add(&mut app, &id, &text).await
        }
        Command::Subtask(SubtaskCommand::Toggle { id, subtask_id }) => {
            tasks::subtask_toggle(&mut app, &id, &subtask_id).await
        }
        Command::Deps { id, depends_on } => tasks::deps(&mut app, &id, &depends_on).await,
        Command::Recur { id, rule } => tasks::recur(&mut app, &id, rule).await,
        Command::Rm { id } => tasks::rm(&mut app, &id).await,
        Command::Tags { action: None } => {
            tags::list(&app);
            Ok(())
        }
        Command::Tags {
            action: Some(TagsCommand::Add { name }),
        } => tags::add(&mut app, &custom_tags, &default_tags, &name).await,
        Command::Watch(args) => {
            app.filter = args.to_filter()?;
            tasks::watch(&mut app, &store, &provider, format).await
        }
        Command::Signin(_) | Command::Signout | Command::Whoami => Ok(()),
    }
}
