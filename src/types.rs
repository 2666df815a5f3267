//! Core types for Taskify.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tags offered when no configuration overrides them.
pub const DEFAULT_TAGS: [&str; 4] = ["work", "personal", "shopping", "health"];

/// Profile returned by the identity provider.
///
/// `email` is the partition key for every task query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
}

impl UserProfile {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            display_name: None,
            email: email.into(),
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    /// First whitespace-separated word of the display name, or "".
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("")
    }
}

/// A checklist item embedded in a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// A todo item mirrored from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Human-readable creation timestamp.
    pub created_at: String,
    pub is_priority: bool,
    pub due_date: Option<NaiveDate>,
    pub tag: Option<String>,
    /// Accumulated tracked time in milliseconds.
    pub time_spent: i64,
    pub is_tracking: bool,
    /// Start of the open tracking session (ms since epoch), set iff `is_tracking`.
    pub start_time: Option<i64>,
    pub subtasks: Vec<Subtask>,
    pub dependencies: Vec<String>,
    /// iCalendar-style RRULE text. Stored only, never expanded.
    pub recurrence: Option<String>,
    pub user_email: String,
}

impl Task {
    /// Apply every field set in `patch`.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(ref text) = patch.text {
            self.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(is_priority) = patch.is_priority {
            self.is_priority = is_priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(ref tag) = patch.tag {
            self.tag = tag.clone();
        }
        if let Some(time_spent) = patch.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(is_tracking) = patch.is_tracking {
            self.is_tracking = is_tracking;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(ref subtasks) = patch.subtasks {
            self.subtasks = subtasks.clone();
        }
        if let Some(ref dependencies) = patch.dependencies {
            self.dependencies = dependencies.clone();
        }
        if let Some(ref recurrence) = patch.recurrence {
            self.recurrence = recurrence.clone();
        }
    }
}

/// Record sent to the store when a task is created.
///
/// Every optional field starts out at its empty default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub text: String,
    pub created_at: String,
    pub user_email: String,
}

impl NewTask {
    /// Materialize the stored record under the id the store assigned.
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            text: self.text,
            completed: false,
            created_at: self.created_at,
            is_priority: false,
            due_date: None,
            tag: None,
            time_spent: 0,
            is_tracking: false,
            start_time: None,
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            recurrence: None,
            user_email: self.user_email,
        }
    }
}

/// Partial update merged into a stored task.
///
/// `None` leaves a field untouched. Nullable fields use a nested `Option`
/// so that `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub is_priority: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tag: Option<Option<String>>,
    pub time_spent: Option<i64>,
    pub is_tracking: Option<bool>,
    pub start_time: Option<Option<i64>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub dependencies: Option<Vec<String>>,
    pub recurrence: Option<Option<String>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn priority(mut self, is_priority: bool) -> Self {
        self.is_priority = Some(is_priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn tag(mut self, tag: Option<String>) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = Some(subtasks);
        self
    }

    pub fn dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn recurrence(mut self, rule: Option<String>) -> Self {
        self.recurrence = Some(rule);
        self
    }

    /// Open a tracking session starting at `start_ms`.
    pub fn start_tracking(mut self, start_ms: i64) -> Self {
        self.is_tracking = Some(true);
        self.start_time = Some(Some(start_ms));
        self
    }

    /// Close the tracking session with the new accumulated total.
    pub fn stop_tracking(mut self, time_spent: i64) -> Self {
        self.is_tracking = Some(false);
        self.start_time = Some(None);
        self.time_spent = Some(time_spent);
        self
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this patch touches, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.text.is_some() {
            names.push("text");
        }
        if self.completed.is_some() {
            names.push("completed");
        }
        if self.is_priority.is_some() {
            names.push("isPriority");
        }
        if self.due_date.is_some() {
            names.push("dueDate");
        }
        if self.tag.is_some() {
            names.push("tag");
        }
        if self.time_spent.is_some() {
            names.push("timeSpent");
        }
        if self.is_tracking.is_some() {
            names.push("isTracking");
        }
        if self.start_time.is_some() {
            names.push("startTime");
        }
        if self.subtasks.is_some() {
            names.push("subtasks");
        }
        if self.dependencies.is_some() {
            names.push("dependencies");
        }
        if self.recurrence.is_some() {
            names.push("recurrence");
        }
        names
    }
}

/// Store-side condition checked atomically before a conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The stored tracking fields must be exactly the ones the patch was
    /// computed from.
    Tracking {
        is_tracking: bool,
        start_time: Option<i64>,
        time_spent: i64,
    },
}

impl Precondition {
    /// Guard on the tracking state `task` currently has.
    pub fn tracking_state(task: &Task) -> Self {
        Precondition::Tracking {
            is_tracking: task.is_tracking,
            start_time: task.start_time,
            time_spent: task.time_spent,
        }
    }

    pub fn holds(&self, task: &Task) -> bool {
        match *self {
            Precondition::Tracking {
                is_tracking,
                start_time,
                time_spent,
            } => {
                task.is_tracking == is_tracking
                    && task.start_time == start_time
                    && task.time_spent == time_spent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        NewTask {
            text: "Write report".to_string(),
            created_at: "1/2/2025, 9:00:00 AM".to_string(),
            user_email: "ada@example.com".to_string(),
        }
        .into_task("t1".to_string())
    }

    #[test]
    fn test_new_task_defaults() {
        let task = sample_task();
        assert!(!task.completed);
        assert!(!task.is_priority);
        assert!(!task.is_tracking);
        assert_eq!(task.time_spent, 0);
        assert!(task.due_date.is_none());
        assert!(task.tag.is_none());
        assert!(task.start_time.is_none());
        assert!(task.subtasks.is_empty());
        assert!(task.dependencies.is_empty());
        assert!(task.recurrence.is_none());
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut task = sample_task();
        task.tag = Some("work".to_string());

        task.apply(&TaskPatch::new().priority(true));

        assert!(task.is_priority);
        assert_eq!(task.tag.as_deref(), Some("work"));
        assert_eq!(task.text, "Write report");
    }

    #[test]
    fn test_patch_can_clear_nullable_fields() {
        let mut task = sample_task();
        task.tag = Some("work".to_string());
        task.recurrence = Some("FREQ=DAILY".to_string());

        task.apply(&TaskPatch::new().tag(None).recurrence(None));

        assert!(task.tag.is_none());
        assert!(task.recurrence.is_none());
    }

    #[test]
    fn test_tracking_patches_keep_fields_together() {
        let mut task = sample_task();
        task.apply(&TaskPatch::new().start_tracking(1_000));
        assert!(task.is_tracking);
        assert_eq!(task.start_time, Some(1_000));

        task.apply(&TaskPatch::new().stop_tracking(4_000));
        assert!(!task.is_tracking);
        assert_eq!(task.start_time, None);
        assert_eq!(task.time_spent, 4_000);
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::new().is_empty());
        assert!(!TaskPatch::new().completed(false).is_empty());
        assert_eq!(
            TaskPatch::new().completed(true).tag(None).field_names(),
            vec!["completed", "tag"]
        );
    }

    #[test]
    fn test_first_name() {
        let profile = UserProfile::new("ada@example.com").with_display_name("Ada Lovelace");
        assert_eq!(profile.first_name(), "Ada");
        assert_eq!(UserProfile::new("x@example.com").first_name(), "");
    }

    #[test]
    fn test_precondition() {
        let mut task = sample_task();
        let idle = Precondition::tracking_state(&task);
        assert!(idle.holds(&task));

        task.apply(&TaskPatch::new().start_tracking(1_000));
        assert!(!idle.holds(&task));

        let running = Precondition::tracking_state(&task);
        task.apply(&TaskPatch::new().stop_tracking(600_000));
        task.apply(&TaskPatch::new().start_tracking(900_000));
        // Tracking again, but a different session
        assert!(task.is_tracking);
        assert!(!running.holds(&task));
    }
}
