//! Task CRUD operations.

use super::{now_ms, Database, DbResult};
use crate::error::StoreError;
use crate::types::{NewTask, Precondition, Task, TaskPatch};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let due_date: Option<String> = row.get("due_date")?;
    let subtasks_json: String = row.get("subtasks")?;
    let dependencies_json: String = row.get("dependencies")?;

    Ok(Task {
        id: row.get("id")?,
        text: row.get("text")?,
        completed: row.get("completed")?,
        created_at: row.get("created_at")?,
        is_priority: row.get("is_priority")?,
        // Unparseable dates are treated as unset
        due_date: due_date.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        tag: row.get("tag")?,
        time_spent: row.get("time_spent")?,
        is_tracking: row.get("is_tracking")?,
        start_time: row.get("start_time")?,
        subtasks: serde_json::from_str(&subtasks_json).unwrap_or_default(),
        dependencies: serde_json::from_str(&dependencies_json).unwrap_or_default(),
        recurrence: row.get("recurrence")?,
        user_email: row.get("user_email")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: &str) -> DbResult<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Write every mutable column of `task` back to its row.
fn write_task_internal(conn: &Connection, task: &Task) -> DbResult<()> {
    conn.execute(
        "UPDATE tasks SET
            text = ?1, completed = ?2, is_priority = ?3, due_date = ?4, tag = ?5,
            time_spent = ?6, is_tracking = ?7, start_time = ?8, subtasks = ?9,
            dependencies = ?10, recurrence = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            task.text,
            task.completed,
            task.is_priority,
            task.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            task.tag,
            task.time_spent,
            task.is_tracking,
            task.start_time,
            serde_json::to_string(&task.subtasks)?,
            serde_json::to_string(&task.dependencies)?,
            task.recurrence,
            now_ms(),
            task.id,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert a new task and return its generated id.
    pub fn insert_task(&self, new_task: NewTask) -> DbResult<Task> {
        let task = new_task.into_task(Uuid::now_v7().to_string());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, user_email, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![task.id, task.user_email, task.text, task.created_at, now_ms()],
            )?;
            Ok(())
        })?;

        Ok(task)
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: &str) -> DbResult<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Merge `patch` into a stored task, optionally guarded by a precondition.
    ///
    /// Read, check and write happen in one transaction. Returns the task as stored.
    pub fn update_task(
        &self,
        task_id: &str,
        patch: &TaskPatch,
        precondition: Option<Precondition>,
    ) -> DbResult<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = get_task_internal(&tx, task_id)?
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

            if let Some(condition) = precondition {
                if !condition.holds(&task) {
                    return Err(StoreError::Conflict(task_id.to_string()));
                }
            }

            task.apply(patch);
            write_task_internal(&tx, &task)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a task. Returns the owner's email so subscribers can be notified.
    pub fn delete_task(&self, task_id: &str) -> DbResult<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owner: Option<String> = tx
                .query_row(
                    "SELECT user_email FROM tasks WHERE id = ?1",
                    params![task_id],
                    |row| row.get(0),
                )
                .optional()?;
            let owner = owner.ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            tx.commit()?;
            Ok(owner)
        })
    }

    /// All tasks owned by a user, in insertion order.
    pub fn list_tasks_for_user(&self, user_email: &str) -> DbResult<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM tasks WHERE user_email = ?1 ORDER BY seq")?;

            let tasks = stmt
                .query_map(params![user_email], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subtask;

    fn new_task(text: &str, email: &str) -> NewTask {
        NewTask {
            text: text.to_string(),
            created_at: "3/14/2025, 12:00:00 PM".to_string(),
            user_email: email.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let task = db.insert_task(new_task("Buy milk", "ada@example.com")).unwrap();

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored, task);
    }

    #[test]
    fn test_update_round_trips_json_columns() {
        let db = Database::open_in_memory().unwrap();
        let task = db.insert_task(new_task("Plan trip", "ada@example.com")).unwrap();

        let patch = TaskPatch::new()
            .subtasks(vec![Subtask {
                id: "s1".to_string(),
                text: "Book hotel".to_string(),
                completed: false,
            }])
            .dependencies(vec!["other".to_string()])
            .due_date(NaiveDate::from_ymd_opt(2025, 4, 1));
        db.update_task(&task.id, &patch, None).unwrap();

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.subtasks.len(), 1);
        assert_eq!(stored.subtasks[0].text, "Book hotel");
        assert_eq!(stored.dependencies, vec!["other".to_string()]);
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2025, 4, 1));
    }

    #[test]
    fn test_update_missing_task() {
        let db = Database::open_in_memory().unwrap();
        let result = db.update_task("nope", &TaskPatch::new().completed(true), None);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_precondition_rejects_stale_update() {
        let db = Database::open_in_memory().unwrap();
        let task = db.insert_task(new_task("Focus", "ada@example.com")).unwrap();

        let idle = Precondition::tracking_state(&task);
        let started = db
            .update_task(&task.id, &TaskPatch::new().start_tracking(10), Some(idle))
            .unwrap();

        let second = db.update_task(&task.id, &TaskPatch::new().start_tracking(20), Some(idle));
        assert!(matches!(second, Err(StoreError::Conflict(_))));

        // A later session with the same flag does not satisfy the old guard
        let running = Precondition::tracking_state(&started);
        db.update_task(&task.id, &TaskPatch::new().stop_tracking(50), None)
            .unwrap();
        db.update_task(&task.id, &TaskPatch::new().start_tracking(70), None)
            .unwrap();
        let stale_stop = db.update_task(&task.id, &TaskPatch::new().stop_tracking(90), Some(running));
        assert!(matches!(stale_stop, Err(StoreError::Conflict(_))));

        let stored = db.get_task(&task.id).unwrap().unwrap();
        assert!(stored.is_tracking);
        assert_eq!(stored.start_time, Some(70));
        assert_eq!(stored.time_spent, 50);
    }

    #[test]
    fn test_list_is_partitioned_by_user() {
        let db = Database::open_in_memory().unwrap();
        db.insert_task(new_task("Mine", "ada@example.com")).unwrap();
        db.insert_task(new_task("Theirs", "bob@example.com")).unwrap();
        db.insert_task(new_task("Mine too", "ada@example.com")).unwrap();

        let tasks = db.list_tasks_for_user("ada@example.com").unwrap();
        let texts: Vec<&str> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Mine", "Mine too"]);
    }

    #[test]
    fn test_delete_reports_owner() {
        let db = Database::open_in_memory().unwrap();
        let task = db.insert_task(new_task("Old", "ada@example.com")).unwrap();

        assert_eq!(db.delete_task(&task.id).unwrap(), "ada@example.com");
        assert!(db.get_task(&task.id).unwrap().is_none());
        assert!(matches!(db.delete_task(&task.id), Err(StoreError::NotFound(_))));
    }
}
