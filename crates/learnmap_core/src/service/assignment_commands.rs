//! Owners, collaborators and mentor replies on goals and tasks.
//!
//! # Invariants
//! - Only the topic's owner or one of its collaborators can own or join a
//!   goal or task under that topic.
//! - With a loaded user directory, an unknown user is `NotFound`.
//! - Every command is version-gated like any other goal/task write.

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::model::goal::Goal;
use crate::model::require_title;
use crate::model::task::Task;
use crate::model::topic::TopicId;
use crate::model::user::{UserId, UserRef};
use crate::service::topic_service::{GoalPath, TaskPath, TopicService};
use crate::service::version_gate::reject;
use crate::sync::records::{GoalPatch, TaskPatch};
use crate::ValidationError;

impl TopicService {
    pub fn set_goal_owner(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Goal> {
        self.goal_for_edit(path, expected_version)?;
        self.ensure_assignable(path.topic_id, user_id, "goal_owner")?;
        let patch = GoalPatch {
            owner_id: Some(user_id),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_owner")
    }

    pub fn add_goal_collaborator(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Goal> {
        let mut ids = user_ids(&self.goal_for_edit(path, expected_version)?.collaborators);
        self.ensure_assignable(path.topic_id, user_id, "goal_collaborator_add")?;
        if ids.contains(&user_id) {
            return Err(already_collaborating("goal_collaborator_add"));
        }
        ids.push(user_id);
        let patch = GoalPatch {
            collaborator_ids: Some(ids),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_collaborator_add")
    }

    pub fn remove_goal_collaborator(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Goal> {
        let mut ids = user_ids(&self.goal_for_edit(path, expected_version)?.collaborators);
        if !ids.contains(&user_id) {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }
        ids.retain(|id| *id != user_id);
        let patch = GoalPatch {
            collaborator_ids: Some(ids),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_collaborator_remove")
    }

    /// Records a mentor's answer to the goal's help request.
    pub fn set_goal_reply(
        &mut self,
        path: GoalPath,
        expected_version: u64,
        message: &str,
    ) -> CoreResult<Goal> {
        let message =
            require_title("reply_message", message).map_err(|err| reject("goal_reply", err))?;
        let patch = GoalPatch {
            reply_message: Some(Some(message)),
            reply_at: Some(Some(self.now())),
            ..GoalPatch::default()
        };
        self.commit_goal(path, expected_version, &patch, "goal_reply")
    }

    pub fn set_task_owner(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Task> {
        self.task_for_edit(path, expected_version)?;
        self.ensure_assignable(path.topic_id, user_id, "task_owner")?;
        let patch = TaskPatch {
            owner_id: Some(user_id),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_owner")
    }

    pub fn add_task_collaborator(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Task> {
        let mut ids = user_ids(&self.task_for_edit(path, expected_version)?.collaborators);
        self.ensure_assignable(path.topic_id, user_id, "task_collaborator_add")?;
        if ids.contains(&user_id) {
            return Err(already_collaborating("task_collaborator_add"));
        }
        ids.push(user_id);
        let patch = TaskPatch {
            collaborator_ids: Some(ids),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_collaborator_add")
    }

    pub fn remove_task_collaborator(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Task> {
        let mut ids = user_ids(&self.task_for_edit(path, expected_version)?.collaborators);
        if !ids.contains(&user_id) {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }
        ids.retain(|id| *id != user_id);
        let patch = TaskPatch {
            collaborator_ids: Some(ids),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_collaborator_remove")
    }

    pub fn set_task_reply(
        &mut self,
        path: TaskPath,
        expected_version: u64,
        message: &str,
    ) -> CoreResult<Task> {
        let message =
            require_title("reply_message", message).map_err(|err| reject("task_reply", err))?;
        let patch = TaskPatch {
            reply_message: Some(Some(message)),
            reply_at: Some(Some(self.now())),
            ..TaskPatch::default()
        };
        self.commit_task(path, expected_version, &patch, "task_reply")
    }

    fn ensure_assignable(
        &mut self,
        topic_id: TopicId,
        user_id: UserId,
        command: &'static str,
    ) -> CoreResult<()> {
        self.directory.ensure_loaded(self.users.as_ref());
        if !self.directory.is_empty() && self.directory.get(user_id).is_none() {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }
        let topic = self
            .stores
            .topics
            .get(topic_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Topic, topic_id))?;
        if !topic.is_member(user_id) {
            return Err(reject(
                command,
                ValidationError::new("user_id", "only the topic owner or its collaborators can be assigned"),
            ));
        }
        Ok(())
    }
}

fn user_ids(users: &[UserRef]) -> Vec<UserId> {
    users.iter().map(UserRef::id).collect()
}

fn already_collaborating(command: &'static str) -> CoreError {
    reject(
        command,
        ValidationError::new("user_id", "user is already a collaborator"),
    )
}
