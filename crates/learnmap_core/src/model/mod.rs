//! Domain model for the Topic → Goal → Task hierarchy.
//!
//! # Responsibility
//! - Define the canonical flat records held by the entity stores.
//! - Keep children addressed by ordered id lists, never embedded objects.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID and carries a `version`.
//! - Removal is a status transition to `archived`, restorable until purged remotely.

pub mod goal;
pub mod task;
pub mod template;
pub mod topic;
pub mod tree;
pub mod user;

use serde::{Deserialize, Serialize};

/// Shared priority scale for goals and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

pub(crate) fn require_title(field: &'static str, value: &str) -> Result<String, crate::ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::ValidationError::new(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}
