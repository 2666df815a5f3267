//! Task List Manager.
//!
//! Owns the local mirror of the signed-in user's tasks. The mirror is only
//! ever replaced wholesale from store snapshots; user actions are validated
//! against it and then sent to the store as single remote mutations.

pub mod deps;
pub mod tracking;

use crate::clock::Clock;
use crate::error::{TaskError, TaskResult};
use crate::filter::{self, TaskFilter};
use crate::store::{DocumentStore, Snapshot, Subscription};
use crate::types::{DEFAULT_TAGS, NewTask, Subtask, Task, TaskPatch, UserProfile};
use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use tracking::format_time_spent;

/// Display format for `createdAt`.
const CREATED_AT_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

struct ActiveSession {
    profile: UserProfile,
    subscription: Subscription,
}

pub struct TaskListManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    tags: Vec<String>,
    session: Option<ActiveSession>,
    tasks: Vec<Task>,
}

impl TaskListManager {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            session: None,
            tasks: Vec::new(),
        }
    }

    /// Replace the known tag set.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Bind to `profile`: drop the previous user's subscription and tasks,
    /// then load the new user's tasks from a fresh subscription.
    pub async fn attach(&mut self, profile: UserProfile) -> TaskResult<()> {
        self.detach();

        let mut subscription = self.store.subscribe(&profile.email).await?;
        let snapshot = subscription.current();
        info!(email = %profile.email, tasks = snapshot.tasks.len(), "Session attached");

        self.tasks = snapshot.tasks;
        self.session = Some(ActiveSession {
            profile,
            subscription,
        });
        Ok(())
    }

    /// Cancel the subscription and clear the local collection.
    pub fn detach(&mut self) {
        if let Some(session) = self.session.take() {
            info!(email = %session.profile.email, "Session detached");
            session.subscription.cancel();
        }
        self.tasks.clear();
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    /// Apply the newest pending snapshot, if any. Returns true if one was applied.
    pub fn refresh(&mut self) -> bool {
        let snapshot = match self.session.as_mut() {
            Some(session) => session.subscription.poll_latest(),
            None => None,
        };
        match snapshot {
            Some(snapshot) => self.apply_snapshot(snapshot),
            None => false,
        }
    }

    /// Wait for the next snapshot and apply it.
    pub async fn next_change(&mut self) -> TaskResult<()> {
        let session = self.session.as_mut().ok_or_else(TaskError::not_signed_in)?;
        let snapshot = session.subscription.changed().await?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        let Some(ref session) = self.session else {
            return false;
        };
        if snapshot.user_email != session.profile.email {
            warn!(
                expected = %session.profile.email,
                got = %snapshot.user_email,
                "Ignoring snapshot for another user"
            );
            return false;
        }
        debug!(tasks = snapshot.tasks.len(), "Applying snapshot");
        self.tasks = snapshot.tasks;
        true
    }

    // =========================================================================
    // Local reads
    // =========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    fn find(&self, id: &str) -> TaskResult<&Task> {
        self.get(id).ok_or_else(|| TaskError::not_found(id))
    }

    fn require_session(&self) -> TaskResult<&UserProfile> {
        self.profile().ok_or_else(TaskError::not_signed_in)
    }

    /// Current time from the manager's clock.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Filtered view at the current clock time.
    pub fn view(&self, filter: &TaskFilter) -> Vec<&Task> {
        filter::filter_tasks(&self.tasks, filter, self.clock.now())
    }

    /// True if every prerequisite of `id` is completed or no longer exists.
    pub fn dependency_gate(&self, id: &str) -> TaskResult<bool> {
        let task = self.find(id)?;
        Ok(deps::dependency_gate(task, &self.tasks))
    }

    /// Display text of the prerequisites still holding `id` back.
    pub fn pending_dependencies(&self, id: &str) -> TaskResult<Vec<String>> {
        let task = self.find(id)?;
        Ok(deps::pending_dependencies(task, &self.tasks))
    }

    /// Display text of the tasks that depend on `id`.
    pub fn dependents(&self, id: &str) -> Vec<String> {
        deps::dependents(id, &self.tasks)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a task. It appears locally once the store's snapshot arrives.
    pub async fn create(&self, text: &str) -> TaskResult<String> {
        let profile = self.require_session()?;
        let text = text.trim();
        if text.is_empty() {
            warn!("Rejected empty task");
            return Err(TaskError::validation("text", "Please enter a task"));
        }

        let new_task = NewTask {
            text: text.to_string(),
            created_at: self.clock.now().format(CREATED_AT_FORMAT).to_string(),
            user_email: profile.email.clone(),
        };
        let id = self.store.insert(new_task).await?;
        debug!(task = %id, "Created task");
        Ok(id)
    }

    /// Merge `patch` into task `id` after checking the local invariants.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> TaskResult<()> {
        self.require_session()?;
        let task = self.find(id)?;
        self.validate_patch(task, &patch)?;

        debug!(task = %id, fields = ?patch.field_names(), "Updating task");
        self.store.update(id, patch).await?;
        Ok(())
    }

    fn validate_patch(&self, task: &Task, patch: &TaskPatch) -> TaskResult<()> {
        if let Some(ref text) = patch.text {
            if text.trim().is_empty() {
                return Err(TaskError::validation("text", "Please enter a task"));
            }
        }

        if patch.completed == Some(true) && !task.completed {
            let pending = deps::pending_dependencies(task, &self.tasks);
            if !deps::dependency_gate(task, &self.tasks) {
                warn!(task = %task.id, blockers = ?pending, "Completion blocked");
                return Err(TaskError::blocked_by(&pending));
            }
        }

        if let Some(ref dependencies) = patch.dependencies {
            for dep in dependencies {
                let newly_added = !task.dependencies.contains(dep);
                if newly_added && self.get(dep).is_none() {
                    return Err(TaskError::not_found(dep).with_field("dependencies"));
                }
            }
            if let Some(offender) = deps::find_cycle(&task.id, dependencies, &self.tasks) {
                warn!(task = %task.id, dependency = %offender, "Rejected cyclic dependency");
                return Err(TaskError::cyclic_dependency(&task.id, offender));
            }
        }

        // Tracking fields only move through the guarded toggle
        if patch.is_tracking.is_some() || patch.start_time.is_some() || patch.time_spent.is_some() {
            warn!(task = %task.id, fields = ?patch.field_names(), "Rejected tracking patch");
            return Err(TaskError::validation(
                "isTracking",
                "Time tracking changes go through toggle_time_tracking",
            ));
        }
        Ok(())
    }

    /// Flip completion. Completing requires every prerequisite to be done.
    pub async fn toggle_complete(&self, id: &str) -> TaskResult<()> {
        self.require_session()?;
        let completed = self.find(id)?.completed;
        self.update(id, TaskPatch::new().completed(!completed)).await
    }

    pub async fn toggle_priority(&self, id: &str) -> TaskResult<()> {
        self.require_session()?;
        let is_priority = self.find(id)?.is_priority;
        self.update(id, TaskPatch::new().priority(!is_priority)).await
    }

    pub async fn set_due_date(&self, id: &str, due_date: Option<NaiveDate>) -> TaskResult<()> {
        self.update(id, TaskPatch::new().due_date(due_date)).await
    }

    /// Assign one of the known tags, or clear it with `None`/"".
    pub async fn set_tag(&self, id: &str, tag: Option<&str>) -> TaskResult<()> {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty());
        if let Some(tag) = tag {
            if !self.tags.iter().any(|t| t == tag) {
                return Err(TaskError::validation("tag", format!("Unknown tag: {}", tag))
                    .with_details(format!("Known tags: {}", self.tags.join(", "))));
            }
        }
        self.update(id, TaskPatch::new().tag(tag.map(String::from)))
            .await
    }

    /// Replace the prerequisite set. Duplicates are dropped, order is kept.
    pub async fn set_dependencies(&self, id: &str, dependencies: Vec<String>) -> TaskResult<()> {
        let mut unique: Vec<String> = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }
        self.update(id, TaskPatch::new().dependencies(unique)).await
    }

    /// Store a recurrence rule verbatim. An empty rule clears it.
    pub async fn set_recurrence(&self, id: &str, rule: Option<&str>) -> TaskResult<()> {
        let rule = rule
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);
        self.update(id, TaskPatch::new().recurrence(rule)).await
    }

    /// Delete a task nothing else depends on.
    pub async fn delete(&self, id: &str) -> TaskResult<()> {
        self.require_session()?;
        self.find(id)?;

        let dependents = self.dependents(id);
        if !dependents.is_empty() {
            warn!(task = %id, dependents = ?dependents, "Delete blocked");
            return Err(TaskError::has_dependents(&dependents));
        }

        self.store.delete(id).await?;
        debug!(task = %id, "Deleted task");
        Ok(())
    }

    /// Start or stop the tracking session. Returns the new tracking state.
    ///
    /// All three tracking fields are written in one conditional update that
    /// requires the stored tracking state to match the local one, so a toggle
    /// issued against stale local state fails with `Conflict`.
    pub async fn toggle_time_tracking(&self, id: &str) -> TaskResult<bool> {
        self.require_session()?;
        let task = self.find(id)?;
        let (guard, patch) = tracking::toggle_patch(task, self.clock.now_ms());
        let tracking = patch.is_tracking.unwrap_or(task.is_tracking);

        self.store.update_if(id, guard, patch).await?;
        debug!(task = %id, tracking, "Toggled time tracking");
        Ok(tracking)
    }

    /// Append a subtask. Blank text is a no-op and returns `None`.
    pub async fn add_subtask(&self, id: &str, text: &str) -> TaskResult<Option<String>> {
        self.require_session()?;
        let task = self.find(id)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let subtask_id = Uuid::now_v7().to_string();
        let mut subtasks = task.subtasks.clone();
        subtasks.push(Subtask {
            id: subtask_id.clone(),
            text: text.to_string(),
            completed: false,
        });

        self.update(id, TaskPatch::new().subtasks(subtasks)).await?;
        Ok(Some(subtask_id))
    }

    /// Flip one subtask. The parent's own completion is untouched.
    pub async fn toggle_subtask_complete(&self, id: &str, subtask_id: &str) -> TaskResult<()> {
        self.require_session()?;
        let task = self.find(id)?;
        if !task.subtasks.iter().any(|s| s.id == subtask_id) {
            return Err(TaskError::not_found(subtask_id).with_field("subtaskId"));
        }

        let subtasks = task
            .subtasks
            .iter()
            .map(|s| {
                let mut s = s.clone();
                if s.id == subtask_id {
                    s.completed = !s.completed;
                }
                s
            })
            .collect();

        self.update(id, TaskPatch::new().subtasks(subtasks)).await
    }

    /// Extend the known tag set for this session.
    pub fn add_tag(&mut self, tag: &str) -> TaskResult<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(TaskError::validation("tag", "Tag name is required"));
        }
        if self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return Err(TaskError::validation("tag", format!("Tag already exists: {}", tag)));
        }
        self.tags.push(tag.to_string());
        Ok(())
    }
}
