//! Action log edits and the per-task progress summary.
//!
//! # Responsibility
//! - Produce the next action log for check-in, cancel, add-count, add-amount
//!   and reset.
//! - Summarize a task's log into streaks, amounts and a completion percentage.
//!
//! # Invariants
//! - Edits only append, drop the single latest same-day check-in, or clear.
//! - A second check-in on the same day yields `LogEdit::Unchanged`.

use crate::model::task::{ActionType, Task, TaskAction, TaskConfig, TaskStatus};
use crate::progress::cycle::{active_window, CycleWindow};
use crate::progress::streak::{
    added_counts, check_in_dates, current_streak, daily_amounts, max_streak, total_amount,
    total_count,
};
use crate::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Outcome of a log edit; `Unchanged` needs no remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEdit {
    Unchanged,
    Changed(Vec<TaskAction>),
}

/// Rejects action kinds that make no sense for the task's type.
pub fn ensure_supports(task: &Task, action: ActionType) -> Result<(), ValidationError> {
    let supported = match action {
        ActionType::CheckIn => matches!(
            task.task_config,
            TaskConfig::Count { .. } | TaskConfig::Streak { .. }
        ),
        ActionType::AddCount => matches!(task.task_config, TaskConfig::Count { .. }),
        ActionType::AddAmount => matches!(task.task_config, TaskConfig::Accumulative { .. }),
    };
    if !supported {
        return Err(ValidationError::new(
            "action_type",
            format!("{action:?} is not available for {:?} tasks", task.task_type()),
        ));
    }
    if task.status == TaskStatus::Archived {
        return Err(ValidationError::new("status", "archived tasks cannot record progress"));
    }
    Ok(())
}

pub fn record_check_in(actions: &[TaskAction], day: NaiveDate, at: DateTime<Utc>) -> LogEdit {
    let already = actions
        .iter()
        .any(|action| action.action_type == ActionType::CheckIn && action.action_date == day);
    if already {
        return LogEdit::Unchanged;
    }
    let mut next = actions.to_vec();
    next.push(TaskAction::check_in(day, at));
    LogEdit::Changed(next)
}

/// Drops the most recent check-in dated `day`, if any.
pub fn cancel_check_in(actions: &[TaskAction], day: NaiveDate) -> LogEdit {
    let latest = actions
        .iter()
        .rposition(|action| action.action_type == ActionType::CheckIn && action.action_date == day);
    match latest {
        Some(index) => {
            let mut next = actions.to_vec();
            next.remove(index);
            LogEdit::Changed(next)
        }
        None => LogEdit::Unchanged,
    }
}

pub fn record_count(
    actions: &[TaskAction],
    day: NaiveDate,
    at: DateTime<Utc>,
    count: u32,
) -> Result<LogEdit, ValidationError> {
    if count == 0 {
        return Err(ValidationError::new("count", "must be greater than zero"));
    }
    let mut next = actions.to_vec();
    next.push(TaskAction::add_count(day, at, count));
    Ok(LogEdit::Changed(next))
}

pub fn record_amount(
    actions: &[TaskAction],
    day: NaiveDate,
    at: DateTime<Utc>,
    amount: f64,
    unit: Option<String>,
) -> Result<LogEdit, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::new("amount", "must be a positive number"));
    }
    let mut next = actions.to_vec();
    next.push(TaskAction::add_amount(day, at, amount, unit));
    Ok(LogEdit::Changed(next))
}

pub fn reset_log(actions: &[TaskAction]) -> LogEdit {
    if actions.is_empty() {
        LogEdit::Unchanged
    } else {
        LogEdit::Changed(Vec::new())
    }
}

/// Read-side progress view of one task, recomputed on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub check_in_dates: Vec<NaiveDate>,
    pub checked_in_today: bool,
    pub current_streak: u32,
    pub max_streak: u32,
    pub total_amount: f64,
    pub daily_amounts: BTreeMap<NaiveDate, f64>,
    /// Sum of `add_count` entries over the whole log.
    pub total_count: u32,
    pub cycle_window: Option<CycleWindow>,
    pub check_ins_in_window: usize,
    /// Check-in days plus added counts inside the cycle window.
    pub count_in_window: u32,
    /// 0..=100.
    pub completion_percent: u8,
}

impl TaskProgress {
    pub fn summarize(task: &Task, today: NaiveDate) -> Self {
        let dates = check_in_dates(&task.actions);
        let cycle_window = active_window(task.cycle_config.as_ref(), today);
        let check_ins_in_window = cycle_window
            .map(|window| dates.iter().filter(|date| window.contains(**date)).count())
            .unwrap_or(0);
        let added_in_window: u32 = cycle_window
            .map(|window| {
                added_counts(&task.actions)
                    .filter(|(date, _)| window.contains(*date))
                    .map(|(_, count)| count)
                    .sum()
            })
            .unwrap_or(0);
        let count_in_window = check_ins_in_window as u32 + added_in_window;
        let added = total_count(&task.actions);
        let current = current_streak(&dates, today);
        let total = total_amount(&task.actions);

        let completion_percent = match &task.task_config {
            TaskConfig::Single => {
                if task.is_done() {
                    100
                } else {
                    0
                }
            }
            TaskConfig::Count { target_count } => {
                let counted = if cycle_window.is_some() {
                    count_in_window
                } else {
                    dates.len() as u32 + added
                };
                percent(f64::from(counted), f64::from(*target_count))
            }
            TaskConfig::Streak { target_days } => {
                percent(f64::from(current), f64::from(*target_days))
            }
            TaskConfig::Accumulative { target_amount, .. } => percent(total, *target_amount),
        };

        Self {
            checked_in_today: dates.contains(&today),
            current_streak: current,
            max_streak: max_streak(&dates),
            total_amount: total,
            daily_amounts: daily_amounts(&task.actions),
            check_in_dates: dates,
            total_count: added,
            cycle_window,
            check_ins_in_window,
            count_in_window,
            completion_percent,
        }
    }
}

fn percent(value: f64, target: f64) -> u8 {
    if target <= 0.0 || !target.is_finite() {
        return 0;
    }
    let ratio = (value / target * 100.0).round();
    ratio.clamp(0.0, 100.0) as u8
}
