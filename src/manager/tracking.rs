//! Time tracking accumulation.

use crate::types::{Precondition, Task, TaskPatch};

/// Patch and store-side guard for flipping a task's tracking state at `now_ms`.
///
/// Stopping adds the elapsed session to `time_spent`; a clock that moved
/// backwards contributes nothing. The guard pins all three tracking fields,
/// so the patch only lands on the exact state it was computed from.
pub fn toggle_patch(task: &Task, now_ms: i64) -> (Precondition, TaskPatch) {
    let guard = Precondition::tracking_state(task);
    if task.is_tracking {
        let elapsed = task
            .start_time
            .map(|start| (now_ms - start).max(0))
            .unwrap_or(0);
        (guard, TaskPatch::new().stop_tracking(task.time_spent + elapsed))
    } else {
        (guard, TaskPatch::new().start_tracking(now_ms))
    }
}

/// Render a duration as whole hours and minutes, e.g. `2h 30m`.
pub fn format_time_spent(ms: i64) -> String {
    let minutes = ms.max(0) / 60_000;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTask;

    fn task() -> Task {
        NewTask {
            text: "Focus".to_string(),
            created_at: String::new(),
            user_email: "ada@example.com".to_string(),
        }
        .into_task("t".to_string())
    }

    #[test]
    fn test_start_then_stop_adds_elapsed() {
        let mut t = task();
        t.time_spent = 1_000;

        let (guard, start) = toggle_patch(&t, 10_000);
        assert_eq!(
            guard,
            Precondition::Tracking {
                is_tracking: false,
                start_time: None,
                time_spent: 1_000,
            }
        );
        t.apply(&start);

        let (guard, stop) = toggle_patch(&t, 12_500);
        assert_eq!(
            guard,
            Precondition::Tracking {
                is_tracking: true,
                start_time: Some(10_000),
                time_spent: 1_000,
            }
        );
        t.apply(&stop);

        assert_eq!(t.time_spent, 3_500);
        assert!(!t.is_tracking);
        assert!(t.start_time.is_none());
    }

    #[test]
    fn test_backwards_clock_adds_nothing() {
        let mut t = task();
        t.is_tracking = true;
        t.start_time = Some(5_000);

        let (_, stop) = toggle_patch(&t, 4_000);
        assert_eq!(stop.time_spent, Some(0));
    }

    #[test]
    fn test_format_time_spent() {
        assert_eq!(format_time_spent(0), "0h 0m");
        assert_eq!(format_time_spent(59_999), "0h 0m");
        assert_eq!(format_time_spent(9_000_000), "2h 30m");
        assert_eq!(format_time_spent(25 * 3_600_000 + 60_000), "25h 1m");
    }
}
