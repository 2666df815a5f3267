//! Output formatting utilities for markdown and JSON.

use crate::filter::{TaskStats, is_overdue, stats};
use crate::manager::deps::pending_dependencies;
use crate::manager::format_time_spent;
use crate::types::Task;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Output format for rendered task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Format a single task as markdown.
///
/// `all_tasks` resolves dependency ids to display text; `now` decides
/// whether the due date has passed.
pub fn format_task_markdown(task: &Task, all_tasks: &[Task], now: DateTime<Local>) -> String {
    let mut md = String::new();

    let check = if task.completed { "x" } else { " " };
    let star = if task.is_priority { " ★" } else { "" };
    md.push_str(&format!("- [{}] {}{}\n", check, task.text, star));
    md.push_str(&format!("  - **id**: `{}`\n", task.id));

    if let Some(ref tag) = task.tag {
        md.push_str(&format!("  - **tag**: {}\n", tag));
    }
    if let Some(due) = task.due_date {
        let overdue = if is_overdue(task, now) { " (overdue)" } else { "" };
        md.push_str(&format!(
            "  - **due**: {}{}\n",
            due.format("%Y-%m-%d"),
            overdue
        ));
    }
    if task.time_spent > 0 || task.is_tracking {
        let live = if task.is_tracking { " (tracking)" } else { "" };
        md.push_str(&format!(
            "  - **time**: {}{}\n",
            format_time_spent(task.time_spent),
            live
        ));
    }
    if let Some(ref rule) = task.recurrence {
        md.push_str(&format!("  - **repeats**: {}\n", rule));
    }

    let blocked_by = pending_dependencies(task, all_tasks);
    if !blocked_by.is_empty() {
        md.push_str(&format!("  - **blocked_by**: {}\n", blocked_by.join(", ")));
    }

    for subtask in &task.subtasks {
        let check = if subtask.completed { "x" } else { " " };
        md.push_str(&format!(
            "  - [{}] {} (`{}`)\n",
            check, subtask.text, subtask.id
        ));
    }

    md
}

fn format_stats_markdown(stats: &TaskStats) -> String {
    format!(
        "**Total**: {} | **Completed**: {} | **Priority**: {} | **Upcoming**: {}\n",
        stats.total, stats.completed, stats.priority, stats.upcoming
    )
}

/// Format a filtered list as markdown, headed by the greeting and followed
/// by stats over every task.
pub fn format_tasks_markdown(
    greeting: &str,
    tasks: &[&Task],
    all_tasks: &[Task],
    now: DateTime<Local>,
) -> String {
    let mut md = format!("# {}\n\n", greeting);

    if tasks.is_empty() {
        md.push_str("_No tasks to show._\n");
    } else {
        let done = tasks.iter().filter(|t| t.completed).count();
        md.push_str(&format!("{} of {} done\n\n", done, tasks.len()));
        for task in tasks {
            md.push_str(&format_task_markdown(task, all_tasks, now));
        }
    }

    md.push('\n');
    md.push_str(&format_stats_markdown(&stats(all_tasks, now)));
    md
}

/// Format a filtered list as JSON. `stats` covers `all_tasks`.
pub fn format_tasks_json(tasks: &[&Task], all_tasks: &[Task], now: DateTime<Local>) -> Value {
    let items: Vec<Value> = tasks
        .iter()
        .map(|task| {
            let mut value = serde_json::to_value(task).unwrap_or(Value::Null);
            if let Value::Object(ref mut map) = value {
                map.insert(
                    "blockedBy".to_string(),
                    json!(pending_dependencies(task, all_tasks)),
                );
                map.insert(
                    "timeSpentDisplay".to_string(),
                    json!(format_time_spent(task.time_spent)),
                );
                map.insert("overdue".to_string(), json!(is_overdue(task, now)));
            }
            value
        })
        .collect();
    json!({
        "count": items.len(),
        "tasks": items,
        "stats": stats(all_tasks, now),
    })
}

/// Render in the requested format.
pub fn render(
    format: OutputFormat,
    greeting: &str,
    tasks: &[&Task],
    all_tasks: &[Task],
    now: DateTime<Local>,
) -> String {
    match format {
        OutputFormat::Markdown => format_tasks_markdown(greeting, tasks, all_tasks, now),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&format_tasks_json(tasks, all_tasks, now))
                .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
        }
    }
}
