//! Goal domain model.
//!
//! # Invariants
//! - `topic_id` names the topic whose `goal_ids` lists this goal.
//! - `task_ids` is ordered and each id points back at this goal.

use crate::model::require_title;
use crate::model::task::TaskId;
use crate::model::topic::TopicId;
use crate::model::user::UserRef;
use crate::model::Priority;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type GoalId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Todo,
    Focus,
    Pause,
    Finish,
    Complete,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub id: GoalId,
    pub topic_id: TopicId,
    pub title: String,
    pub description: String,
    pub status: GoalStatus,
    pub priority: Priority,
    pub version: u64,
    pub owner: Option<UserRef>,
    pub collaborators: Vec<UserRef>,
    pub task_ids: Vec<TaskId>,
    pub need_help: bool,
    pub help_message: Option<String>,
    /// Mentor answer to a help request.
    pub reply_message: Option<String>,
    pub reply_at: Option<DateTime<Utc>>,
    pub order_index: i64,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_active(&self) -> bool {
        self.status != GoalStatus::Archived
    }

    pub fn is_focused(&self) -> bool {
        self.status == GoalStatus::Focus
    }
}

/// Input for `TopicService::add_goal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: GoalStatus,
}

impl GoalDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            status: GoalStatus::Todo,
        }
    }

    pub fn validated_title(&self) -> Result<String, ValidationError> {
        if self.status == GoalStatus::Archived {
            return Err(ValidationError::new(
                "status",
                "a new goal cannot start archived",
            ));
        }
        require_title("goal title", &self.title)
    }
}
