//! Remote source-of-truth contracts.
//!
//! # Responsibility
//! - Describe the two fetch shapes and the version-gated mutation calls the
//!   core consumes from the server.
//! - Describe the user directory feed.
//!
//! # Invariants
//! - Every record returned carries `version` and `updated_at`.
//! - `update_*` never applies a patch whose expected version is stale; it
//!   answers `Mutation::Conflict` with the stored version instead.
//! - Transport, retry and backoff policy live behind these traits.

use crate::model::goal::GoalId;
use crate::model::task::TaskId;
use crate::model::topic::TopicId;
use crate::model::user::{User, UserId};
use crate::sync::records::{GoalPatch, GoalRecord, TaskPatch, TaskRecord, TopicPatch, TopicRecord};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Network,
    Auth,
    Server,
    Decode,
}

impl Display for RemoteErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Server => "server",
            Self::Decode => "decode",
        };
        f.write_str(label)
    }
}

/// Transport-level failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// Whether the same call may succeed later without a refetch.
    pub retryable: bool,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message, true)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Auth, message, false)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Server, message, false)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Decode, message, false)
    }
}

/// Answer to a version-gated mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    /// Patch applied; carries the server-confirmed record.
    Applied(T),
    /// Expected version was stale; nothing was applied.
    Conflict { actual: u64 },
    Missing,
}

/// Bulk user feed. Must be safe to call repeatedly.
pub trait UserSource: Send + Sync {
    fn list_users(&self) -> RemoteResult<Vec<User>>;
}

/// Server-side store of topics, goals and tasks.
pub trait RemoteSource: Send + Sync {
    /// All topics visible to `user_id`, each with nested `goals[].tasks[]`.
    fn fetch_user_topics(&self, user_id: UserId) -> RemoteResult<Vec<Value>>;

    /// One topic with nested `goals[].tasks[]`, or `None` when unknown.
    fn fetch_topic(&self, topic_id: TopicId) -> RemoteResult<Option<Value>>;

    fn insert_topic(&self, record: TopicRecord) -> RemoteResult<TopicRecord>;
    fn insert_goal(&self, record: GoalRecord) -> RemoteResult<GoalRecord>;
    fn insert_task(&self, record: TaskRecord) -> RemoteResult<TaskRecord>;

    fn update_topic(
        &self,
        id: TopicId,
        expected_version: u64,
        patch: &TopicPatch,
    ) -> RemoteResult<Mutation<TopicRecord>>;

    fn update_goal(
        &self,
        id: GoalId,
        expected_version: u64,
        patch: &GoalPatch,
    ) -> RemoteResult<Mutation<GoalRecord>>;

    fn update_task(
        &self,
        id: TaskId,
        expected_version: u64,
        patch: &TaskPatch,
    ) -> RemoteResult<Mutation<TaskRecord>>;
}
