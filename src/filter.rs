//! Filter and search over the local task collection.
//!
//! Everything here is pure: the view is recomputed from the current tasks
//! and filter inputs on every render.

use crate::types::Task;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Quick status filter shown as tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Priority,
    Today,
    Upcoming,
}

impl StatusFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(StatusFilter::All),
            "priority" => Some(StatusFilter::Priority),
            "today" => Some(StatusFilter::Today),
            "upcoming" => Some(StatusFilter::Upcoming),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl CompletionStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(CompletionStatus::All),
            "completed" | "done" => Some(CompletionStatus::Completed),
            "incomplete" | "open" => Some(CompletionStatus::Incomplete),
            _ => None,
        }
    }

    fn matches(&self, completed: bool) -> bool {
        match self {
            CompletionStatus::All => true,
            CompletionStatus::Completed => completed,
            CompletionStatus::Incomplete => !completed,
        }
    }
}

/// Inclusive due-date range at day granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// A task without a due date never matches a set range.
    fn matches(&self, due: Option<NaiveDate>) -> bool {
        let Some(due) = due else {
            return !self.is_set();
        };
        if self.start.is_some_and(|start| due < start) {
            return false;
        }
        if self.end.is_some_and(|end| due > end) {
            return false;
        }
        true
    }
}

/// Filters from the advanced panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedFilters {
    /// Empty means every tag.
    pub tags: Vec<String>,
    pub date_range: DateRange,
    pub completion: CompletionStatus,
}

/// Every input that shapes the rendered list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub query: String,
    /// Applied only while the advanced panel is open.
    pub advanced: Option<AdvancedFilters>,
}

impl TaskFilter {
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_advanced(mut self, advanced: AdvancedFilters) -> Self {
        self.advanced = Some(advanced);
        self
    }
}

/// Due strictly after `now`. Due dates start at local midnight.
pub fn is_upcoming(task: &Task, now: DateTime<Local>) -> bool {
    task.due_date.is_some_and(|due| {
        due.and_hms_opt(0, 0, 0)
            .is_some_and(|midnight| midnight > now.naive_local())
    })
}

/// The due date is a day that has already ended.
pub fn is_overdue(task: &Task, now: DateTime<Local>) -> bool {
    task.due_date.is_some_and(|due| due < now.date_naive())
}

fn matches_status(task: &Task, status: StatusFilter, now: DateTime<Local>) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Priority => task.is_priority,
        StatusFilter::Today => task.due_date == Some(now.date_naive()),
        StatusFilter::Upcoming => is_upcoming(task, now),
    }
}

/// Case-insensitive substring match on text, tag, or any subtask text.
pub fn matches_query(task: &Task, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    task.text.to_lowercase().contains(&needle)
        || task
            .tag
            .as_deref()
            .is_some_and(|tag| tag.to_lowercase().contains(&needle))
        || task
            .subtasks
            .iter()
            .any(|s| s.text.to_lowercase().contains(&needle))
}

fn matches_advanced(task: &Task, advanced: &AdvancedFilters) -> bool {
    if !advanced.tags.is_empty() {
        let tagged = task
            .tag
            .as_ref()
            .is_some_and(|tag| advanced.tags.contains(tag));
        if !tagged {
            return false;
        }
    }
    advanced.date_range.matches(task.due_date) && advanced.completion.matches(task.completed)
}

/// True if `task` satisfies every part of `filter` at time `now`.
pub fn matches(task: &Task, filter: &TaskFilter, now: DateTime<Local>) -> bool {
    matches_status(task, filter.status, now)
        && matches_query(task, &filter.query)
        && filter
            .advanced
            .as_ref()
            .is_none_or(|advanced| matches_advanced(task, advanced))
}

/// The subset of `tasks` that satisfies `filter`, in collection order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter, now: DateTime<Local>) -> Vec<&'a Task> {
    tasks.iter().filter(|t| matches(t, filter, now)).collect()
}

/// Counts shown under the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub priority: usize,
    pub upcoming: usize,
}

/// Stats over the whole collection, whatever filter is active.
pub fn stats(tasks: &[Task], now: DateTime<Local>) -> TaskStats {
    tasks.iter().fold(TaskStats::default(), |mut acc, task| {
        acc.total += 1;
        acc.completed += usize::from(task.completed);
        acc.priority += usize::from(task.is_priority);
        acc.upcoming += usize::from(is_upcoming(task, now));
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::types::{NewTask, Subtask};

    fn task(id: &str, text: &str) -> Task {
        NewTask {
            text: text.to_string(),
            created_at: String::new(),
            user_email: "ada@example.com".to_string(),
        }
        .into_task(id.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Local> {
        ManualClock::at_noon(2025, 3, 14).now()
    }

    fn ids(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn dated_tasks() -> Vec<Task> {
        let mut yesterday = task("yesterday", "Past");
        yesterday.due_date = Some(date(2025, 3, 13));
        let mut today = task("today", "Now");
        today.due_date = Some(date(2025, 3, 14));
        let mut tomorrow = task("tomorrow", "Soon");
        tomorrow.due_date = Some(date(2025, 3, 15));
        let undated = task("undated", "Whenever");
        vec![yesterday, today, tomorrow, undated]
    }

    #[test]
    fn test_all_returns_everything() {
        let tasks = dated_tasks();
        assert_eq!(filter_tasks(&tasks, &TaskFilter::default(), now()).len(), 4);
    }

    #[test]
    fn test_priority_filter() {
        let mut tasks = dated_tasks();
        tasks[2].is_priority = true;
        let filter = TaskFilter::default().with_status(StatusFilter::Priority);
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["tomorrow"]);
    }

    #[test]
    fn test_today_filter() {
        let tasks = dated_tasks();
        let filter = TaskFilter::default().with_status(StatusFilter::Today);
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["today"]);
    }

    #[test]
    fn test_upcoming_is_strictly_after_now() {
        let tasks = dated_tasks();
        let filter = TaskFilter::default().with_status(StatusFilter::Upcoming);
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["tomorrow"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_text_tag_and_subtasks() {
        let mut by_text = task("a", "Call the Plumber");
        by_text.tag = Some("personal".to_string());
        let mut by_tag = task("b", "Quarterly report");
        by_tag.tag = Some("Work".to_string());
        let mut by_subtask = task("c", "Groceries");
        by_subtask.subtasks.push(Subtask {
            id: "s1".to_string(),
            text: "Oat milk".to_string(),
            completed: false,
        });
        let tasks = vec![by_text, by_tag, by_subtask];

        let search = |q: &str| ids(filter_tasks(&tasks, &TaskFilter::default().with_query(q), now()));
        assert_eq!(search("PLUMBER"), vec!["a"]);
        assert_eq!(search("work"), vec!["b"]);
        assert_eq!(search("milk"), vec!["c"]);
        assert_eq!(search(""), vec!["a", "b", "c"]);
        assert!(search("dentist").is_empty());
    }

    #[test]
    fn test_advanced_ignored_when_panel_closed() {
        let tasks = dated_tasks();
        let filter = TaskFilter::default();
        assert!(filter.advanced.is_none());
        assert_eq!(filter_tasks(&tasks, &filter, now()).len(), 4);
    }

    #[test]
    fn test_tag_membership() {
        let mut work = task("w", "Deploy");
        work.tag = Some("work".to_string());
        let mut health = task("h", "Run");
        health.tag = Some("health".to_string());
        let untagged = task("u", "Misc");
        let tasks = vec![work, health, untagged];

        let filter = TaskFilter::default().with_advanced(AdvancedFilters {
            tags: vec!["work".to_string(), "shopping".to_string()],
            ..Default::default()
        });
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["w"]);

        let vacuous = TaskFilter::default().with_advanced(AdvancedFilters::default());
        assert_eq!(filter_tasks(&tasks, &vacuous, now()).len(), 3);
    }

    #[test]
    fn test_date_range_same_day_returns_only_that_day() {
        let tasks = dated_tasks();
        let filter = TaskFilter::default().with_advanced(AdvancedFilters {
            date_range: DateRange {
                start: Some(date(2025, 3, 14)),
                end: Some(date(2025, 3, 14)),
            },
            ..Default::default()
        });
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["today"]);
    }

    #[test]
    fn test_one_sided_range_excludes_undated() {
        let tasks = dated_tasks();
        let from = TaskFilter::default().with_advanced(AdvancedFilters {
            date_range: DateRange {
                start: Some(date(2025, 3, 14)),
                end: None,
            },
            ..Default::default()
        });
        assert_eq!(ids(filter_tasks(&tasks, &from, now())), vec!["today", "tomorrow"]);

        let until = TaskFilter::default().with_advanced(AdvancedFilters {
            date_range: DateRange {
                start: None,
                end: Some(date(2025, 3, 13)),
            },
            ..Default::default()
        });
        assert_eq!(ids(filter_tasks(&tasks, &until, now())), vec!["yesterday"]);
    }

    #[test]
    fn test_completion_status() {
        let mut tasks = dated_tasks();
        tasks[0].completed = true;

        let done = TaskFilter::default().with_advanced(AdvancedFilters {
            completion: CompletionStatus::Completed,
            ..Default::default()
        });
        assert_eq!(ids(filter_tasks(&tasks, &done, now())), vec!["yesterday"]);

        let open = TaskFilter::default().with_advanced(AdvancedFilters {
            completion: CompletionStatus::Incomplete,
            ..Default::default()
        });
        assert_eq!(filter_tasks(&tasks, &open, now()).len(), 3);
    }

    #[test]
    fn test_all_criteria_combine() {
        let mut tasks = dated_tasks();
        tasks[1].is_priority = true;
        tasks[1].tag = Some("work".to_string());
        tasks[2].is_priority = true;

        let filter = TaskFilter::default()
            .with_status(StatusFilter::Priority)
            .with_query("now")
            .with_advanced(AdvancedFilters {
                tags: vec!["work".to_string()],
                ..Default::default()
            });
        assert_eq!(ids(filter_tasks(&tasks, &filter, now())), vec!["today"]);
    }

    #[test]
    fn test_stats_count_whole_collection() {
        let mut tasks = dated_tasks();
        tasks[0].completed = true;
        tasks[1].completed = true;
        tasks[3].is_priority = true;

        assert_eq!(
            stats(&tasks, now()),
            TaskStats {
                total: 4,
                completed: 2,
                priority: 1,
                upcoming: 1,
            }
        );
        assert_eq!(stats(&[], now()), TaskStats::default());
    }

    #[test]
    fn test_overdue_once_the_day_has_ended() {
        let tasks = dated_tasks();
        let overdue: Vec<&str> = tasks
            .iter()
            .filter(|t| is_overdue(t, now()))
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(overdue, vec!["yesterday"]);

        let next_morning = ManualClock::at_noon(2025, 3, 15).now();
        assert!(is_overdue(&tasks[1], next_morning));
        assert!(!is_overdue(&tasks[3], next_morning));
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!(StatusFilter::from_str("Today"), Some(StatusFilter::Today));
        assert_eq!(StatusFilter::from_str("later"), None);
        assert_eq!(
            CompletionStatus::from_str("incomplete"),
            Some(CompletionStatus::Incomplete)
        );
    }
}
