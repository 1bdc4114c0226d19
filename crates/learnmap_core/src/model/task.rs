//! Task domain model and its append-only action log.
//!
//! # Responsibility
//! - Describe actionable units and their type-specific targets.
//! - Hold the action log that all streak/accumulation numbers fold from.
//!
//! # Invariants
//! - `actions` is append-only; entries are never reordered or edited in place.
//! - `task_config` alone decides the task type.
//! - `completed_at` is set exactly when `status == Done`.

use crate::model::goal::GoalId;
use crate::model::require_title;
use crate::model::user::UserRef;
use crate::model::Priority;
use crate::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Single,
    Count,
    Streak,
    Accumulative,
}

/// Type-specific completion target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskConfig {
    #[default]
    Single,
    Count {
        target_count: u32,
    },
    Streak {
        target_days: u32,
    },
    Accumulative {
        target_amount: f64,
        #[serde(default)]
        unit: String,
    },
}

impl TaskConfig {
    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Single => TaskType::Single,
            Self::Count { .. } => TaskType::Count,
            Self::Streak { .. } => TaskType::Streak,
            Self::Accumulative { .. } => TaskType::Accumulative,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Single => Ok(()),
            Self::Count { target_count: 0 } => Err(ValidationError::new(
                "target_count",
                "must be greater than zero",
            )),
            Self::Streak { target_days: 0 } => Err(ValidationError::new(
                "target_days",
                "must be greater than zero",
            )),
            Self::Accumulative { target_amount, .. }
                if !target_amount.is_finite() || *target_amount <= 0.0 =>
            {
                Err(ValidationError::new(
                    "target_amount",
                    "must be a positive number",
                ))
            }
            Self::Count { .. } | Self::Streak { .. } | Self::Accumulative { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleType {
    #[default]
    None,
    Weekly,
}

/// Recurrence window for count tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default)]
    pub cycle_type: CycleType,
    /// Normalized back to its Monday when the window is computed.
    #[serde(default)]
    pub cycle_start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CheckIn,
    AddCount,
    AddAmount,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAction {
    pub action_type: ActionType,
    /// Calendar day in the configured reference timezone.
    pub action_date: NaiveDate,
    pub action_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub action_data: ActionData,
}

impl TaskAction {
    pub fn check_in(action_date: NaiveDate, at: DateTime<Utc>) -> Self {
        Self {
            action_type: ActionType::CheckIn,
            action_date,
            action_timestamp: at,
            action_data: ActionData::default(),
        }
    }

    pub fn add_count(action_date: NaiveDate, at: DateTime<Utc>, count: u32) -> Self {
        Self {
            action_type: ActionType::AddCount,
            action_date,
            action_timestamp: at,
            action_data: ActionData {
                count: Some(count),
                ..ActionData::default()
            },
        }
    }

    pub fn add_amount(
        action_date: NaiveDate,
        at: DateTime<Utc>,
        amount: f64,
        unit: Option<String>,
    ) -> Self {
        Self {
            action_type: ActionType::AddAmount,
            action_date,
            action_timestamp: at,
            action_data: ActionData {
                amount: Some(amount),
                unit,
                ..ActionData::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub goal_id: GoalId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub task_config: TaskConfig,
    pub cycle_config: Option<CycleConfig>,
    pub actions: Vec<TaskAction>,
    pub version: u64,
    pub owner: Option<UserRef>,
    pub collaborators: Vec<UserRef>,
    pub need_help: bool,
    pub help_message: Option<String>,
    pub reply_message: Option<String>,
    pub reply_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub order_index: i64,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn task_type(&self) -> TaskType {
        self.task_config.task_type()
    }

    pub fn is_active(&self) -> bool {
        self.status != TaskStatus::Archived
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Input for `TopicService::add_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub task_config: TaskConfig,
    pub cycle_config: Option<CycleConfig>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, task_config: TaskConfig) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            task_config,
            cycle_config: None,
        }
    }

    pub fn validated_title(&self) -> Result<String, ValidationError> {
        self.task_config.validate()?;
        require_title("task title", &self.title)
    }
}
