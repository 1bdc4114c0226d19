//! Progress commands: check-in, cancel, add-count, add-amount and reset.
//!
//! # Invariants
//! - The calendar day comes from the service's `CalendarPolicy`.
//! - A no-op edit (repeat check-in, nothing to cancel, empty reset) returns
//!   the stored task without a remote call, after the version check.
//! - The first recorded action moves a `todo` task to `in_progress`.

use crate::error::CoreResult;
use crate::model::task::{ActionType, Task, TaskAction, TaskConfig, TaskStatus};
use crate::progress::recorder::{
    cancel_check_in, ensure_supports, record_amount, record_check_in, record_count, reset_log,
    LogEdit,
};
use crate::service::topic_service::{TaskPath, TopicService};
use crate::service::version_gate::reject;
use crate::sync::records::TaskPatch;
use log::debug;

impl TopicService {
    /// Records today's check-in; repeating it the same day changes nothing.
    pub fn check_in(&mut self, path: TaskPath, expected_version: u64) -> CoreResult<Task> {
        let today = self.today();
        let now = self.now();
        let task = self.task_for_edit(path, expected_version)?;
        ensure_supports(task, ActionType::CheckIn).map_err(|err| reject("task_check_in", err))?;
        let edit = record_check_in(&task.actions, today, now);
        self.apply_log_edit(path, expected_version, edit, "task_check_in")
    }

    /// Drops today's check-in if there is one.
    pub fn cancel_today_check_in(
        &mut self,
        path: TaskPath,
        expected_version: u64,
    ) -> CoreResult<Task> {
        let today = self.today();
        let task = self.task_for_edit(path, expected_version)?;
        ensure_supports(task, ActionType::CheckIn)
            .map_err(|err| reject("task_cancel_check_in", err))?;
        let edit = cancel_check_in(&task.actions, today);
        self.apply_log_edit(path, expected_version, edit, "task_cancel_check_in")
    }

    /// Adds `count` completions to a count task; unlike check-ins these stack
    /// within a day.
    pub fn add_count(&mut self, path: TaskPath, expected_version: u64, count: u32) -> CoreResult<Task> {
        let today = self.today();
        let now = self.now();
        let task = self.task_for_edit(path, expected_version)?;
        ensure_supports(task, ActionType::AddCount).map_err(|err| reject("task_add_count", err))?;
        let edit = record_count(&task.actions, today, now, count)
            .map_err(|err| reject("task_add_count", err))?;
        self.apply_log_edit(path, expected_version, edit, "task_add_count")
    }

    /// Adds `amount` to an accumulative task; the unit defaults to the task's.
    pub fn add_amount(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        amount: f64,
        unit: Option<String>,
    ) -> CoreResult<Task> {
        let today = self.today();
        let now = self.now();
        let task = self.task_for_edit(path, expected_version)?;
        ensure_supports(task, ActionType::AddAmount).map_err(|err| reject("task_add_amount", err))?;
        let unit = unit.or_else(|| match &task.task_config {
            TaskConfig::Accumulative { unit, .. } if !unit.is_empty() => Some(unit.clone()),
            _ => None,
        });
        let edit = record_amount(&task.actions, today, now, amount, unit)
            .map_err(|err| reject("task_add_amount", err))?;
        self.apply_log_edit(path, expected_version, edit, "task_add_amount")
    }

    /// Clears the action log; status is left as it is.
    pub fn reset_progress(&mut self, path: TaskPath, expected_version: u64) -> CoreResult<Task> {
        let task = self.task_for_edit(path, expected_version)?;
        let edit = reset_log(&task.actions);
        self.apply_log_edit(path, expected_version, edit, "task_reset")
    }

    fn apply_log_edit(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        edit: LogEdit,
        command: &'static str,
    ) -> CoreResult<Task> {
        let task = self.task_for_edit(path, expected_version)?;
        let actions: Vec<TaskAction> = match edit {
            LogEdit::Unchanged => {
                debug!("event={command} module=service status=skipped reason=no_change");
                return Ok(task.clone());
            }
            LogEdit::Changed(actions) => actions,
        };
        let starts_progress = task.status == TaskStatus::Todo && !actions.is_empty();
        let patch = TaskPatch {
            actions: Some(actions),
            status: starts_progress.then_some(TaskStatus::InProgress),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, command)
    }
}
