//! User references.
//!
//! Users are owned by the user directory; topics, goals and tasks only point
//! at them. A pointer that cannot be resolved stays usable as a bare id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Mentor,
    Parent,
    Admin,
}

/// Directory entry as served by the user source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
            color: None,
            role: UserRole::Student,
        }
    }
}

/// Owner/collaborator pointer after directory resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Resolved(User),
    /// Directory miss, or the directory could not be loaded.
    Unresolved(UserId),
}

impl UserRef {
    pub fn id(&self) -> UserId {
        match self {
            Self::Resolved(user) => user.id,
            Self::Unresolved(id) => *id,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Resolved(user) => Some(user),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Access level granted to a topic collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[default]
    View,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    pub user: UserRef,
    pub permission: Permission,
    pub invited_at: Option<DateTime<Utc>>,
}
