//! Dependency gating and cycle detection over the local collection.
//!
//! Edges point from a task to each of its prerequisites.

use crate::types::Task;
use std::collections::{HashMap, HashSet, VecDeque};

fn index(tasks: &[Task]) -> HashMap<&str, &Task> {
    tasks.iter().map(|t| (t.id.as_str(), t)).collect()
}

/// True if `task` may become completed.
///
/// A prerequisite that no longer exists never blocks.
pub fn dependency_gate(task: &Task, tasks: &[Task]) -> bool {
    if task.dependencies.is_empty() {
        return true;
    }
    let by_id = index(tasks);
    task.dependencies
        .iter()
        .all(|dep| by_id.get(dep.as_str()).is_none_or(|t| t.completed))
}

/// Display text of prerequisites that exist and are still incomplete.
pub fn pending_dependencies(task: &Task, tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| task.dependencies.contains(&t.id) && !t.completed)
        .map(|t| t.text.clone())
        .collect()
}

/// Display text of every other task that lists `task_id` as a prerequisite.
pub fn dependents(task_id: &str, tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| t.id != task_id && t.dependencies.iter().any(|d| d == task_id))
        .map(|t| t.text.clone())
        .collect()
}

/// Check if making `task_id` depend on `dependency_id` would create a cycle.
///
/// A cycle closes when `task_id` is already reachable from `dependency_id`.
/// Edges of `task_id` itself are ignored since they are being replaced.
pub fn would_create_cycle(task_id: &str, dependency_id: &str, tasks: &[Task]) -> bool {
    let by_id = index(tasks);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(dependency_id);

    while let Some(current) = queue.pop_front() {
        if current == task_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(task) = by_id.get(current) {
            for dep in &task.dependencies {
                if !visited.contains(dep.as_str()) {
                    queue.push_back(dep.as_str());
                }
            }
        }
    }

    false
}

/// First prerequisite in `dependencies` that would close a cycle through `task_id`.
pub fn find_cycle<'a>(task_id: &str, dependencies: &'a [String], tasks: &[Task]) -> Option<&'a str> {
    dependencies
        .iter()
        .map(String::as_str)
        .find(|dep| would_create_cycle(task_id, dep, tasks))
}
