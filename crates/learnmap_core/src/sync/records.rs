//! Wire records and partial updates exchanged with the remote source.
//!
//! # Responsibility
//! - Mirror the server's row shapes (raw user ids, no embedded children).
//! - Describe partial updates and how a server applies them.
//!
//! # Invariants
//! - A patch with no fields is rejected before it leaves the core.
//! - Ordering, membership, replies and the action log are set by dedicated
//!   commands; `validate` rejects caller patches that carry them.
//! - `apply_to` never touches `version`; the caller owns the bump.

use crate::model::goal::{GoalId, GoalStatus};
use crate::model::require_title;
use crate::model::task::{CycleConfig, TaskAction, TaskConfig, TaskId, TaskStatus, TaskType};
use crate::model::topic::{ReferenceInfo, TopicId, TopicStatus};
use crate::model::user::{Collaborator, Permission, UserId};
use crate::model::Priority;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

fn command_only(field: &'static str) -> ValidationError {
    ValidationError::new(field, "only changes through its dedicated command")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default)]
    pub invited_at: Option<DateTime<Utc>>,
}

impl From<&Collaborator> for CollaboratorRecord {
    fn from(value: &Collaborator) -> Self {
        Self {
            user_id: value.user.id(),
            permission: value.permission,
            invited_at: value.invited_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: TopicId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: TopicStatus,
    pub version: u64,
    pub owner_id: UserId,
    #[serde(default)]
    pub topic_collaborators: Vec<CollaboratorRecord>,
    #[serde(default = "default_true")]
    pub show_avatars: bool,
    #[serde(default)]
    pub is_collaborative: bool,
    #[serde(default)]
    pub reference_info: ReferenceInfo,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: GoalId,
    pub topic_id: TopicId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub priority: Priority,
    pub version: u64,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub collaborator_ids: Vec<UserId>,
    #[serde(default)]
    pub need_help: bool,
    #[serde(default)]
    pub help_message: Option<String>,
    #[serde(default)]
    pub reply_message: Option<String>,
    #[serde(default)]
    pub reply_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_index: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub goal_id: GoalId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub task_config: TaskConfig,
    #[serde(default)]
    pub cycle_config: Option<CycleConfig>,
    #[serde(default)]
    pub actions: Vec<TaskAction>,
    pub version: u64,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub collaborator_ids: Vec<UserId>,
    #[serde(default)]
    pub need_help: bool,
    #[serde(default)]
    pub help_message: Option<String>,
    #[serde(default)]
    pub reply_message: Option<String>,
    #[serde(default)]
    pub reply_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_index: i64,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Rejects rows whose declared type disagrees with their config.
    pub fn check_consistency(&self) -> Result<(), String> {
        let config_type = self.task_config.task_type();
        if config_type != self.task_type {
            return Err(format!(
                "task_type {:?} does not match task_config {:?}",
                self.task_type, config_type
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(None)` clears the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TopicStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_avatars: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_collaborative: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_info: Option<ReferenceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_collaborators: Option<Vec<CollaboratorRecord>>,
}

impl TopicPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("patch", "no fields to update"));
        }
        if let Some(title) = &self.title {
            require_title("title", title)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, record: &mut TopicRecord) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(subject) = &self.subject {
            record.subject = subject.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(show_avatars) = self.show_avatars {
            record.show_avatars = show_avatars;
        }
        if let Some(is_collaborative) = self.is_collaborative {
            record.is_collaborative = is_collaborative;
        }
        if let Some(reference_info) = &self.reference_info {
            record.reference_info = reference_info.clone();
        }
        if let Some(collaborators) = &self.topic_collaborators {
            record.topic_collaborators = collaborators.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_help: Option<bool>,
    /// `Some(None)` clears the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator_ids: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("patch", "no fields to update"));
        }
        if let Some(title) = &self.title {
            require_title("goal title", title)?;
        }
        if self.owner_id.is_some() {
            return Err(command_only("owner_id"));
        }
        if self.collaborator_ids.is_some() {
            return Err(command_only("collaborator_ids"));
        }
        if self.reply_message.is_some() || self.reply_at.is_some() {
            return Err(command_only("reply_message"));
        }
        if self.order_index.is_some() {
            return Err(command_only("order_index"));
        }
        Ok(())
    }

    pub fn apply_to(&self, record: &mut GoalRecord) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(need_help) = self.need_help {
            record.need_help = need_help;
        }
        if let Some(help_message) = &self.help_message {
            record.help_message = help_message.clone();
        }
        if let Some(reply_message) = &self.reply_message {
            record.reply_message = reply_message.clone();
        }
        if let Some(reply_at) = self.reply_at {
            record.reply_at = reply_at;
        }
        if let Some(owner_id) = self.owner_id {
            record.owner_id = Some(owner_id);
        }
        if let Some(collaborator_ids) = &self.collaborator_ids {
            record.collaborator_ids = collaborator_ids.clone();
        }
        if let Some(order_index) = self.order_index {
            record.order_index = order_index;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_config: Option<TaskConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_config: Option<Option<CycleConfig>>,
    /// Full replacement log, produced only by the progress commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<TaskAction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_help: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator_ids: Option<Vec<UserId>>,
    /// Follows `status`; stamped by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("patch", "no fields to update"));
        }
        if let Some(title) = &self.title {
            require_title("task title", title)?;
        }
        if let Some(config) = &self.task_config {
            config.validate()?;
        }
        if self.actions.is_some() {
            return Err(ValidationError::new(
                "actions",
                "the action log only changes through progress commands",
            ));
        }
        if self.completed_at.is_some() {
            return Err(command_only("completed_at"));
        }
        if self.owner_id.is_some() {
            return Err(command_only("owner_id"));
        }
        if self.collaborator_ids.is_some() {
            return Err(command_only("collaborator_ids"));
        }
        if self.reply_message.is_some() || self.reply_at.is_some() {
            return Err(command_only("reply_message"));
        }
        if self.order_index.is_some() {
            return Err(command_only("order_index"));
        }
        Ok(())
    }

    pub fn apply_to(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(config) = &self.task_config {
            record.task_type = config.task_type();
            record.task_config = config.clone();
        }
        if let Some(cycle) = self.cycle_config {
            record.cycle_config = cycle;
        }
        if let Some(actions) = &self.actions {
            record.actions = actions.clone();
        }
        if let Some(need_help) = self.need_help {
            record.need_help = need_help;
        }
        if let Some(help_message) = &self.help_message {
            record.help_message = help_message.clone();
        }
        if let Some(reply_message) = &self.reply_message {
            record.reply_message = reply_message.clone();
        }
        if let Some(reply_at) = self.reply_at {
            record.reply_at = reply_at;
        }
        if let Some(owner_id) = self.owner_id {
            record.owner_id = Some(owner_id);
        }
        if let Some(collaborator_ids) = &self.collaborator_ids {
            record.collaborator_ids = collaborator_ids.clone();
        }
        if let Some(completed_at) = self.completed_at {
            record.completed_at = completed_at;
        }
        if let Some(order_index) = self.order_index {
            record.order_index = order_index;
        }
    }
}
