//! Topic templates: a goal/task skeleton copied into a fresh topic.

use crate::model::goal::{GoalDraft, GoalStatus};
use crate::model::task::{CycleConfig, TaskConfig, TaskDraft};
use crate::model::topic::TopicDraft;
use crate::model::Priority;
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub task_config: TaskConfig,
    #[serde(default)]
    pub cycle_config: Option<CycleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tasks: Vec<TaskTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTemplate {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub goals: Vec<GoalTemplate>,
}

/// Per-instantiation values that win over the template's own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_collaborative: bool,
}

impl TopicTemplate {
    pub fn topic_draft(&self, overrides: &TemplateOverrides) -> TopicDraft {
        TopicDraft {
            title: overrides.title.clone().unwrap_or_else(|| self.title.clone()),
            description: overrides
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            subject: self.subject.clone(),
            is_collaborative: overrides.is_collaborative,
            show_avatars: true,
        }
    }

    /// Checks the whole skeleton so instantiation never stops on bad input half-way.
    pub fn validate(&self, overrides: &TemplateOverrides) -> Result<(), ValidationError> {
        self.topic_draft(overrides).validated_title()?;
        for goal in &self.goals {
            goal.draft().validated_title()?;
            for task in &goal.tasks {
                task.draft().validated_title()?;
            }
        }
        Ok(())
    }
}

impl GoalTemplate {
    pub fn draft(&self) -> GoalDraft {
        GoalDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: GoalStatus::Todo,
        }
    }
}

impl TaskTemplate {
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            task_config: self.task_config.clone(),
            cycle_config: self.cycle_config,
        }
    }
}
