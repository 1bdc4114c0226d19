//! Core error taxonomy.
//!
//! # Responsibility
//! - Give every command a typed failure the caller can act on.
//! - Keep conflict, missing-entity, validation and transport failures distinct.
//!
//! # Invariants
//! - A command returning `Err` has left local state exactly as it found it.
//! - `VersionConflict` always carries both the expected and the stored version.

use crate::sync::remote::RemoteError;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

/// Entity family named in conflict and not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Topic,
    Goal,
    Task,
    User,
    Reference,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Topic => "topic",
            Self::Goal => "goal",
            Self::Task => "task",
            Self::User => "user",
            Self::Reference => "reference",
        };
        f.write_str(label)
    }
}

/// Malformed caller input, detected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure of one read or command against the domain state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entity moved on since the caller read it.
    #[error("{kind} {id} was changed elsewhere (expected version {expected}, found {actual})")]
    VersionConflict {
        kind: EntityKind,
        id: Uuid,
        expected: u64,
        actual: u64,
    },
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("remote call failed: {0}")]
    Transport(#[from] RemoteError),
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    /// Whether local data is stale and a refetch should precede any retry.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::NotFound { .. })
    }

    /// Whether repeating the same call (after a refresh for conflicts) can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::VersionConflict { .. } => true,
            Self::Transport(err) => err.retryable,
            Self::NotFound { .. } | Self::Validation(_) => false,
        }
    }

    /// Short actionable message for UI surfaces.
    pub fn user_message(&self) -> String {
        match self {
            Self::VersionConflict { kind, .. } => format!(
                "This {kind} was changed by someone else. Refresh and reapply your change."
            ),
            Self::NotFound { kind, .. } => format!("This {kind} no longer exists. Refresh the page."),
            Self::Validation(err) => err.to_string(),
            Self::Transport(err) if err.retryable => {
                "Could not reach the server. Try again in a moment.".to_string()
            }
            Self::Transport(_) => "The server rejected the request. Sign in again.".to_string(),
        }
    }
}
