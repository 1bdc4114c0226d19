//! Topic domain model.
//!
//! # Responsibility
//! - Define the top-level learning unit and its reference material.
//! - Provide lifecycle helpers for archive/restore.
//!
//! # Invariants
//! - `goal_ids` is ordered and each id points back at this topic.
//! - `version` only changes through a confirmed remote mutation.

use crate::model::goal::GoalId;
use crate::model::user::{Collaborator, UserId, UserRef};
use crate::model::require_title;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TopicId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    #[default]
    Active,
    InProgress,
    Completed,
    Paused,
    /// Soft-deleted; `restore_topic` moves it back to `Active`.
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAttachment {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Links and files attached to a topic as study material.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceInfo {
    #[serde(default)]
    pub links: Vec<ReferenceLink>,
    #[serde(default)]
    pub attachments: Vec<ReferenceAttachment>,
}

/// Canonical flat topic record held by the topic store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub description: String,
    pub subject: Option<String>,
    pub status: TopicStatus,
    pub version: u64,
    pub owner: UserRef,
    pub collaborators: Vec<Collaborator>,
    pub goal_ids: Vec<GoalId>,
    pub show_avatars: bool,
    pub is_collaborative: bool,
    pub reference_info: ReferenceInfo,
    pub template_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    /// Returns whether this topic is visible in active listings.
    pub fn is_active(&self) -> bool {
        self.status != TopicStatus::Archived
    }

    pub fn collaborator(&self, user_id: UserId) -> Option<&Collaborator> {
        self.collaborators
            .iter()
            .find(|collaborator| collaborator.user.id() == user_id)
    }

    /// Owner or invited collaborator.
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.owner.id() == user_id || self.collaborator(user_id).is_some()
    }
}

/// Input for `TopicService::create_topic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDraft {
    pub title: String,
    pub description: String,
    pub subject: Option<String>,
    pub is_collaborative: bool,
    pub show_avatars: bool,
}

impl TopicDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            subject: None,
            is_collaborative: false,
            show_avatars: true,
        }
    }

    /// Returns the trimmed title, or a validation error when blank.
    pub fn validated_title(&self) -> Result<String, ValidationError> {
        require_title("title", &self.title)
    }
}

/// Input for `TopicService::add_reference_attachment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDraft {
    pub title: String,
    pub url: String,
    pub file_type: Option<String>,
    pub size_bytes: Option<u64>,
}
