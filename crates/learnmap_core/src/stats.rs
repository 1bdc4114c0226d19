//! Derived stats over store contents.
//!
//! # Responsibility
//! - Compute completion rate, weekly stats and need-help counts on demand.
//!
//! # Invariants
//! - Pure functions of their inputs; nothing here is cached or stored.
//! - Completion rate is 0 for an empty set and 100 when every task is done.

use crate::model::goal::Goal;
use crate::model::task::{Task, TaskStatus};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyStats {
    pub newly_completed: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
}

/// Whole-percent share of done tasks, rounded half up.
pub fn completion_rate<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> u8 {
    let (done, total) = tasks.into_iter().fold((0usize, 0usize), |(done, total), task| {
        (done + usize::from(task.is_done()), total + 1)
    });
    if total == 0 {
        return 0;
    }
    let rate = (done * 200 + total) / (total * 2);
    u8::try_from(rate.min(100)).unwrap_or(100)
}

/// Single pass over `tasks`.
///
/// `newly_completed` counts done tasks whose `completed_at` falls inside the
/// rolling `window` ending at `now` (both ends inclusive).
pub fn weekly_stats<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: DateTime<Utc>,
    window: Duration,
) -> WeeklyStats {
    let since = now - window;
    let mut stats = WeeklyStats::default();
    for task in tasks {
        stats.total_tasks += 1;
        match task.status {
            TaskStatus::Done => {
                stats.completed_tasks += 1;
                if task
                    .completed_at
                    .is_some_and(|at| at >= since && at <= now)
                {
                    stats.newly_completed += 1;
                }
            }
            TaskStatus::InProgress => stats.in_progress_tasks += 1,
            TaskStatus::Todo | TaskStatus::Archived => {}
        }
    }
    stats
}

pub fn need_help_count<'a>(
    goals: impl IntoIterator<Item = &'a Goal>,
    tasks: impl IntoIterator<Item = &'a Task>,
) -> usize {
    goals.into_iter().filter(|goal| goal.need_help).count()
        + tasks.into_iter().filter(|task| task.need_help).count()
}

#[cfg(test)]
mod tests {
    use super::{completion_rate, need_help_count, weekly_stats};
    use crate::model::goal::Goal;
    use crate::model::task::{Task, TaskConfig, TaskStatus};
    use crate::model::Priority;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            goal_id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            status,
            priority: Priority::Medium,
            task_config: TaskConfig::Single,
            cycle_config: None,
            actions: Vec::new(),
            version: 1,
            owner: None,
            collaborators: Vec::new(),
            need_help: false,
            help_message: None,
            reply_message: None,
            reply_at: None,
            completed_at: None,
            order_index: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn completion_rate_edges() {
        let none: Vec<Task> = Vec::new();
        assert_eq!(completion_rate(&none), 0);
        let all_done = vec![task(TaskStatus::Done), task(TaskStatus::Done)];
        assert_eq!(completion_rate(&all_done), 100);
    }

    #[test]
    fn completion_rate_rounds_half_up() {
        let mut tasks = vec![task(TaskStatus::Done), task(TaskStatus::Todo), task(TaskStatus::Todo)];
        assert_eq!(completion_rate(&tasks), 33);
        tasks[1].status = TaskStatus::Done;
        assert_eq!(completion_rate(&tasks), 67);

        let mut eighths: Vec<Task> = (0..8).map(|_| task(TaskStatus::Todo)).collect();
        eighths[0].status = TaskStatus::Done;
        // 12.5 rounds to 13.
        assert_eq!(completion_rate(&eighths), 13);
    }

    #[test]
    fn completion_rate_never_drops_when_tasks_finish() {
        let mut tasks: Vec<Task> = (0..7).map(|_| task(TaskStatus::Todo)).collect();
        let mut last = completion_rate(&tasks);
        for index in 0..tasks.len() {
            tasks[index].status = TaskStatus::Done;
            let next = completion_rate(&tasks);
            assert!(next >= last);
            last = next;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn weekly_stats_uses_a_rolling_window() {
        let now = Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap();
        let mut recent = task(TaskStatus::Done);
        recent.completed_at = Some(now - Duration::days(7));
        let mut old = task(TaskStatus::Done);
        old.completed_at = Some(now - Duration::days(7) - Duration::seconds(1));
        let tasks = vec![recent, old, task(TaskStatus::InProgress), task(TaskStatus::Todo)];

        let stats = weekly_stats(&tasks, now, Duration::days(7));
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.newly_completed, 1);
        assert_eq!(stats.in_progress_tasks, 1);
    }

    #[test]
    fn need_help_counts_goals_and_tasks() {
        let mut stuck = task(TaskStatus::InProgress);
        stuck.need_help = true;
        let tasks = vec![stuck, task(TaskStatus::Todo)];
        let goals: Vec<Goal> = Vec::new();
        assert_eq!(need_help_count(&goals, &tasks), 1);
    }
}
