//! Goal and task commands, addressed through their parents.
//!
//! # Invariants
//! - A goal is only reachable when its topic lists it and it points back;
//!   a task likewise through its goal. Anything else is `NotFound`.
//! - `completed_at` is stamped when a task becomes done and cleared when it
//!   leaves done; a done task saved as done keeps its stamp.
//! - Parent id lists follow `order_index` after every reorder write.

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::model::goal::{Goal, GoalDraft, GoalId, GoalStatus};
use crate::model::task::{Task, TaskDraft, TaskId, TaskStatus};
use crate::model::topic::TopicId;
use crate::model::user::UserId;
use crate::service::topic_service::{GoalPath, TaskPath, TopicService};
use crate::service::version_gate::{check_confirmed_version, ensure_version, reject, settle, transport};
use crate::sync::normalizer::{goal_from_record, task_from_record};
use crate::sync::records::{GoalPatch, GoalRecord, TaskPatch, TaskRecord};
use crate::ValidationError;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashSet;
use uuid::Uuid;

pub(crate) fn goal_record_from_draft(
    topic_id: TopicId,
    title: String,
    draft: &GoalDraft,
    order_index: i64,
    owner_id: UserId,
    now: DateTime<Utc>,
) -> GoalRecord {
    GoalRecord {
        id: Uuid::new_v4(),
        topic_id,
        title,
        description: draft.description.clone(),
        status: draft.status,
        priority: draft.priority,
        version: 0,
        owner_id: Some(owner_id),
        collaborator_ids: Vec::new(),
        need_help: false,
        help_message: None,
        reply_message: None,
        reply_at: None,
        order_index,
        updated_at: now,
    }
}

pub(crate) fn task_record_from_draft(
    goal_id: GoalId,
    title: String,
    draft: &TaskDraft,
    order_index: i64,
    owner_id: UserId,
    now: DateTime<Utc>,
) -> TaskRecord {
    TaskRecord {
        id: Uuid::new_v4(),
        goal_id,
        title,
        description: draft.description.clone(),
        status: TaskStatus::Todo,
        priority: draft.priority,
        task_type: draft.task_config.task_type(),
        task_config: draft.task_config.clone(),
        cycle_config: draft.cycle_config,
        actions: Vec::new(),
        version: 0,
        owner_id: Some(owner_id),
        collaborator_ids: Vec::new(),
        need_help: false,
        help_message: None,
        reply_message: None,
        reply_at: None,
        completed_at: None,
        order_index,
        updated_at: now,
    }
}

/// Help flag patch fields; lowering the flag drops the message.
fn help_fields(need_help: bool, message: Option<String>) -> (Option<bool>, Option<Option<String>>) {
    let message = if need_help {
        message
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    } else {
        None
    };
    (Some(need_help), Some(message))
}

impl TopicService {
    /// Appends a goal to the end of the topic's goal list.
    pub fn add_goal(&mut self, topic_id: TopicId, draft: GoalDraft) -> CoreResult<Goal> {
        let title = draft.validated_title().map_err(|err| reject("goal_add", err))?;
        let topic = self
            .stores
            .topics
            .get(topic_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Topic, topic_id))?;
        let order_index = next_order_index(self.stores.goals.for_topic(topic).map(|goal| goal.order_index));

        let record = goal_record_from_draft(
            topic_id,
            title,
            &draft,
            order_index,
            self.session_user,
            self.now(),
        );
        let confirmed = self
            .remote
            .insert_goal(record)
            .map_err(|err| transport("goal_add", EntityKind::Goal, err))?;
        let goal = goal_from_record(confirmed, Vec::new(), &self.directory);
        self.stores.attach_goal(goal.clone());
        info!("event=goal_add module=service status=ok version={}", goal.version);
        Ok(goal)
    }

    pub fn update_goal(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        patch: GoalPatch,
    ) -> CoreResult<Goal> {
        patch.validate().map_err(|err| reject("goal_update", err))?;
        self.commit_goal(path, expected_version, &patch, "goal_update")
    }

    pub fn set_goal_status(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        status: GoalStatus,
    ) -> CoreResult<Goal> {
        let patch = GoalPatch {
            status: Some(status),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_status")
    }

    pub fn set_goal_help(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        need_help: bool,
        message: Option<String>,
    ) -> CoreResult<Goal> {
        let (need_help, help_message) = help_fields(need_help, message);
        let patch = GoalPatch {
            need_help,
            help_message,
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_help")
    }

    pub fn delete_goal(&mut self, path: GoalPath, expected_version: u64) -> CoreResult<Goal> {
        let patch = GoalPatch {
            status: Some(GoalStatus::Archived),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_delete")
    }

    pub fn restore_goal(&mut self, path: GoalPath, expected_version: u64) -> CoreResult<Goal> {
        let patch = GoalPatch {
            status: Some(GoalStatus::Todo),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_restore")
    }

    /// Appends a task to the end of the goal's task list.
    pub fn add_task(&mut self, path: GoalPath, draft: TaskDraft) -> CoreResult<Task> {
        let title = draft.validated_title().map_err(|err| reject("task_add", err))?;
        let goal = self
            .verified_goal(path)
            .ok_or_else(|| CoreError::not_found(EntityKind::Goal, path.goal_id))?;
        let order_index = next_order_index(self.stores.tasks.for_goal(goal).map(|task| task.order_index));

        let record = task_record_from_draft(
            path.goal_id,
            title,
            &draft,
            order_index,
            self.session_user,
            self.now(),
        );
        let confirmed = self
            .remote
            .insert_task(record)
            .map_err(|err| transport("task_add", EntityKind::Task, err))?;
        let task = task_from_record(confirmed, &self.directory);
        self.stores.attach_task(task.clone());
        info!("event=task_add module=service status=ok version={}", task.version);
        Ok(task)
    }

    /// Applies a caller-built patch; a status change also moves `completed_at`.
    pub fn update_task(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        mut patch: TaskPatch,
    ) -> CoreResult<Task> {
        patch.validate().map_err(|err| reject("task_update", err))?;
        if let Some(status) = patch.status {
            let current = self.task_for_edit(path, expected_version)?.status;
            patch.completed_at = self.completion_stamp(current, status);
        }
        self.commit_task(path, expected_version, &patch, "task_update")
    }

    pub fn set_task_status(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        status: TaskStatus,
    ) -> CoreResult<Task> {
        let current = self.task_for_edit(path, expected_version)?.status;
        let patch = TaskPatch {
            status: Some(status),
            completed_at: self.completion_stamp(current, status),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_status")
    }

    pub fn set_task_help(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        need_help: bool,
        message: Option<String>,
    ) -> CoreResult<Task> {
        let (need_help, help_message) = help_fields(need_help, message);
        let patch = TaskPatch {
            need_help,
            help_message,
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_help")
    }

    pub fn delete_task(&mut self, path: TaskPath, expected_version: u64) -> CoreResult<Task> {
        let patch = TaskPatch {
            status: Some(TaskStatus::Archived),
            completed_at: Some(None),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_delete")
    }

    pub fn restore_task(&mut self, path: TaskPath, expected_version: u64) -> CoreResult<Task> {
        let patch = TaskPatch {
            status: Some(TaskStatus::Todo),
            completed_at: Some(None),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_restore")
    }

    /// `completed_at` change for a status move; `None` leaves it as stored.
    fn completion_stamp(
        &self,
        current: TaskStatus,
        next: TaskStatus,
    ) -> Option<Option<DateTime<Utc>>> {
        match (current == TaskStatus::Done, next == TaskStatus::Done) {
            (false, true) => Some(Some(self.now())),
            (true, false) => Some(None),
            _ => None,
        }
    }

    /// Moves the topic's goals into the given order.
    ///
    /// `order` lists every goal of the topic once, each with the caller's
    /// expected version. Only goals whose position changes are written; a
    /// transport failure part-way keeps the writes already confirmed.
    pub fn reorder_goals(
        &mut self,
        topic_id: TopicId,
        order: &[(GoalId, u64)],
    ) -> CoreResult<Vec<Goal>> {
        let topic = self
            .stores
            .topics
            .get(topic_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Topic, topic_id))?;
        ensure_permutation(&topic.goal_ids, order).map_err(|err| reject("goal_reorder", err))?;

        let mut writes = Vec::new();
        for (index, (goal_id, expected_version)) in order.iter().enumerate() {
            let goal = self.goal_for_edit(GoalPath::new(topic_id, *goal_id), *expected_version)?;
            if goal.order_index != index as i64 {
                writes.push((*goal_id, *expected_version, index as i64));
            }
        }
        for (goal_id, expected_version, order_index) in writes {
            let patch = GoalPatch {
                order_index: Some(order_index),
                ..GoalPatch::default()
            };
            self.commit_goal(GoalPath::new(topic_id, goal_id), expected_version, &patch, "goal_reorder")?;
        }
        self.stores.sort_goal_ids(topic_id);
        Ok(self.stores.goals_in_order(topic_id))
    }

    /// Moves a goal's tasks into the given order; see `reorder_goals`.
    pub fn reorder_tasks(
        &mut self,
        path: GoalPath,
        order: &[(TaskId, u64)],
    ) -> CoreResult<Vec<Task>> {
        let goal = self
            .verified_goal(path)
            .ok_or_else(|| CoreError::not_found(EntityKind::Goal, path.goal_id))?;
        ensure_permutation(&goal.task_ids, order).map_err(|err| reject("task_reorder", err))?;

        let mut writes = Vec::new();
        for (index, (task_id, expected_version)) in order.iter().enumerate() {
            let task = self.task_for_edit(path.task(*task_id), *expected_version)?;
            if task.order_index != index as i64 {
                writes.push((*task_id, *expected_version, index as i64));
            }
        }
        for (task_id, expected_version, order_index) in writes {
            let patch = TaskPatch {
                order_index: Some(order_index),
                ..TaskPatch::default()
            };
            self.commit_task(path.task(task_id), expected_version, &patch, "task_reorder")?;
        }
        self.stores.sort_task_ids(path.goal_id);
        Ok(self.stores.tasks_in_order(path.goal_id))
    }

    pub(super) fn goal_for_edit(&self, path: GoalPath, expected_version: u64) -> CoreResult<&Goal> {
        let goal = self
            .verified_goal(path)
            .ok_or_else(|| CoreError::not_found(EntityKind::Goal, path.goal_id))?;
        ensure_version(EntityKind::Goal, goal.id, expected_version, goal.version)?;
        Ok(goal)
    }

    pub(super) fn task_for_edit(&self, path: TaskPath, expected_version: u64) -> CoreResult<&Task> {
        let task = self
            .verified_task(path)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, path.task_id))?;
        ensure_version(EntityKind::Task, task.id, expected_version, task.version)?;
        Ok(task)
    }

    pub(super) fn commit_goal(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        patch: &GoalPatch,
        command: &'static str,
    ) -> CoreResult<Goal> {
        let task_ids = self.goal_for_edit(path, expected_version)?.task_ids.clone();
        let outcome = self.remote.update_goal(path.goal_id, expected_version, patch);
        let record = settle(EntityKind::Goal, path.goal_id, expected_version, command, outcome)?;
        check_confirmed_version(EntityKind::Goal, expected_version, record.version);

        let goal = goal_from_record(record, task_ids, &self.directory);
        self.stores.goals.upsert(goal.clone());
        if patch.order_index.is_some() {
            self.stores.sort_goal_ids(path.topic_id);
        }
        info!(
            "event={command} module=service status=ok kind=goal version={}",
            goal.version
        );
        Ok(goal)
    }

    /// Version-gated write of one task patch. The patch is not re-validated
    /// here; progress commands send full action logs through this path.
    pub(super) fn commit_task(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        patch: &TaskPatch,
        command: &'static str,
    ) -> CoreResult<Task> {
        if patch.is_empty() {
            return Err(reject(command, ValidationError::new("patch", "no fields to update")));
        }
        self.task_for_edit(path, expected_version)?;
        let outcome = self.remote.update_task(path.task_id, expected_version, patch);
        let record = settle(EntityKind::Task, path.task_id, expected_version, command, outcome)?;
        check_confirmed_version(EntityKind::Task, expected_version, record.version);

        let task = task_from_record(record, &self.directory);
        self.stores.tasks.upsert(task.clone());
        if patch.order_index.is_some() {
            self.stores.sort_task_ids(path.goal_id);
        }
        info!(
            "event={command} module=service status=ok kind=task version={}",
            task.version
        );
        Ok(task)
    }
}

/// `order` must name every id in `current` exactly once.
fn ensure_permutation(current: &[Uuid], order: &[(Uuid, u64)]) -> Result<(), ValidationError> {
    let listed: HashSet<Uuid> = order.iter().map(|(id, _)| *id).collect();
    let expected: HashSet<Uuid> = current.iter().copied().collect();
    if listed.len() != order.len() || listed != expected {
        return Err(ValidationError::new(
            "order",
            "must list every child of the parent exactly once",
        ));
    }
    Ok(())
}

fn next_order_index(existing: impl Iterator<Item = i64>) -> i64 {
    existing.max().map_or(0, |max| max + 1)
}
