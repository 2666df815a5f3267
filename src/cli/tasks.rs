//! Task subcommands: one user action per invocation, plus `list` and `watch`.

use super::ListArgs;
use crate::app::{Action, App, View};
use crate::filter::{AdvancedFilters, DateRange, TaskFilter};
use crate::format::{self, OutputFormat};
use crate::identity::{IdentityProvider, LocalIdentityProvider};
use crate::manager::TaskListManager;
use crate::store::SqliteStore;
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often `watch` checks the database and the session file for writes
/// from other processes.
const EXTERNAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}': expected YYYY-MM-DD", s))
}

impl ListArgs {
    /// The advanced panel counts as open when any of its inputs is given.
    pub fn to_filter(&self) -> Result<TaskFilter> {
        let mut filter = TaskFilter::default()
            .with_status(self.status)
            .with_query(self.search.clone().unwrap_or_default());

        let date_range = DateRange {
            start: self.from.as_deref().map(parse_date).transpose()?,
            end: self.to.as_deref().map(parse_date).transpose()?,
        };
        if !self.tags.is_empty() || date_range.is_set() || self.completion.is_some() {
            filter = filter.with_advanced(AdvancedFilters {
                tags: self.tags.clone(),
                date_range,
                completion: self.completion.unwrap_or_default(),
            });
        }
        Ok(filter)
    }
}

/// Resolve a full id or a unique id prefix against the loaded tasks.
///
/// Unknown input is passed through so the manager reports it as not found.
pub fn resolve_id(manager: &TaskListManager, input: &str) -> Result<String> {
    let input = input.trim();
    if manager.get(input).is_some() {
        return Ok(input.to_string());
    }
    let matches: Vec<&str> = manager
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(input))
        .map(|t| t.id.as_str())
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Ok(input.to_string()),
        _ => bail!("Id prefix '{}' matches {} tasks", input, matches.len()),
    }
}

/// Refuse to run task commands outside the task view.
pub fn require_tasks_view(app: &App) -> Result<()> {
    if app.view() != View::Tasks || !app.manager().is_attached() {
        bail!("Not signed in. Run `taskify signin --email <address>` first.");
    }
    Ok(())
}

/// Dispatch one action and surface its notice as an error.
pub async fn run_action(app: &mut App, action: Action) -> Result<()> {
    app.dispatch(action).await;
    if let Some(notice) = app.notice() {
        bail!("{}", notice);
    }
    app.on_remote_change();
    Ok(())
}

pub fn render_list(app: &App, output: OutputFormat) -> String {
    let visible = app.visible_tasks();
    format::render(
        output,
        &app.greeting(),
        &visible,
        app.manager().tasks(),
        app.manager().now(),
    )
}

pub async fn add(app: &mut App, text: &str) -> Result<()> {
    let before: Vec<String> = app.manager().tasks().iter().map(|t| t.id.clone()).collect();
    run_action(app, Action::Create(text.to_string())).await?;

    match app
        .manager()
        .tasks()
        .iter()
        .find(|t| !before.contains(&t.id))
    {
        Some(task) => println!("Added `{}`: {}", task.id, task.text),
        None => println!("Added: {}", text.trim()),
    }
    Ok(())
}

pub async fn done(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    run_action(app, Action::ToggleComplete(id.clone())).await?;
    if let Some(task) = app.manager().get(&id) {
        let state = if task.completed { "Completed" } else { "Reopened" };
        println!("{}: {}", state, task.text);
    }
    Ok(())
}

pub async fn priority(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    run_action(app, Action::TogglePriority(id.clone())).await?;
    if let Some(task) = app.manager().get(&id) {
        let state = if task.is_priority { "Prioritized" } else { "Unprioritized" };
        println!("{}: {}", state, task.text);
    }
    Ok(())
}

pub async fn tag(app: &mut App, id: &str, tag: Option<String>) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    run_action(app, Action::SetTag(id, tag.clone())).await?;
    match tag {
        Some(tag) => println!("Tagged: {}", tag),
        None => println!("Tag cleared"),
    }
    Ok(())
}

pub async fn due(app: &mut App, id: &str, date: Option<&str>) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    let date = date.map(parse_date).transpose()?;
    run_action(app, Action::SetDueDate(id, date)).await?;
    match date {
        Some(date) => println!("Due: {}", date.format("%Y-%m-%d")),
        None => println!("Due date cleared"),
    }
    Ok(())
}

pub async fn track(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    run_action(app, Action::ToggleTimeTracking(id.clone())).await?;
    if let Some(task) = app.manager().get(&id) {
        if task.is_tracking {
            println!("Tracking: {}", task.text);
        } else {
            println!(
                "Stopped: {} ({})",
                task.text,
                crate::manager::format_time_spent(task.time_spent)
            );
        }
    }
    Ok(())
}

pub async fn subtask_add(app: &mut App, id: &str, text: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    if text.trim().is_empty() {
        println!("Nothing to add");
        return Ok(());
    }
    run_action(app, Action::AddSubtask(id.clone(), text.to_string())).await?;
    if let Some(subtask) = app.manager().get(&id).and_then(|t| t.subtasks.last()) {
        println!("Added subtask `{}`: {}", subtask.id, subtask.text);
    }
    Ok(())
}

pub async fn subtask_toggle(app: &mut App, id: &str, subtask_id: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    let subtask_id = app
        .manager()
        .get(&id)
        .and_then(|t| {
            let matches: Vec<&str> = t
                .subtasks
                .iter()
                .filter(|s| s.id.starts_with(subtask_id))
                .map(|s| s.id.as_str())
                .collect();
            (matches.len() == 1).then(|| matches[0].to_string())
        })
        .unwrap_or_else(|| subtask_id.to_string());

    run_action(app, Action::ToggleSubtask(id, subtask_id)).await?;
    println!("Subtask toggled");
    Ok(())
}

pub async fn deps(app: &mut App, id: &str, depends_on: &[String]) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    let depends_on = depends_on
        .iter()
        .map(|d| resolve_id(app.manager(), d))
        .collect::<Result<Vec<_>>>()?;
    let count = depends_on.len();
    run_action(app, Action::SetDependencies(id, depends_on)).await?;
    println!("Dependencies set ({})", count);
    Ok(())
}

pub async fn recur(app: &mut App, id: &str, rule: Option<String>) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    run_action(app, Action::SetRecurrence(id, rule.clone())).await?;
    match rule.filter(|r| !r.trim().is_empty()) {
        Some(rule) => println!("Repeats: {}", rule.trim()),
        None => println!("Recurrence cleared"),
    }
    Ok(())
}

pub async fn rm(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app.manager(), id)?;
    let text = app.manager().get(&id).map(|t| t.text.clone());
    run_action(app, Action::Delete(id)).await?;
    println!("Deleted: {}", text.unwrap_or_default());
    Ok(())
}

/// Render, then re-render on every snapshot until Ctrl-C or sign-out.
///
/// A `signout` run from another shell removes the session file; the poll
/// tick reloads it and the auth branch ends the loop.
pub async fn watch(
    app: &mut App,
    store: &SqliteStore,
    provider: &LocalIdentityProvider,
    output: OutputFormat,
) -> Result<()> {
    println!("{}", render_list(app, output));
    let mut auth = provider.on_auth_state_changed();
    let mut poll = tokio::time::interval(EXTERNAL_POLL_INTERVAL);

    loop {
        tokio::select! {
            result = app.manager_mut().next_change() => {
                if let Err(e) = result {
                    warn!(error = %e, "Change feed closed");
                    break;
                }
                debug!("Re-rendering after snapshot");
                println!("{}", render_list(app, output));
            }
            _ = poll.tick() => {
                if let Err(e) = store.sync_external() {
                    warn!(error = %e, "Failed to check for external changes");
                }
                if let Err(e) = provider.reload() {
                    warn!(error = %e, "Failed to re-read session");
                }
            }
            changed = auth.changed() => {
                if changed.is_err() {
                    break;
                }
                let profile = auth.borrow_and_update().clone();
                app.on_auth_changed(profile).await;
                if app.view() != View::Tasks {
                    info!("Signed out, leaving watch");
                    break;
                }
                println!("{}", render_list(app, output));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}
