//! Session cache of the user directory.
//!
//! # Responsibility
//! - Populate lazily from a `UserSource` and resolve raw user ids.
//!
//! # Invariants
//! - A failed load leaves the cache empty and is never fatal to callers.
//! - Resolution of an unknown id yields `UserRef::Unresolved`, not an error.

use crate::model::topic::Topic;
use crate::model::user::{User, UserId, UserRef};
use crate::sync::remote::{RemoteResult, UserSource};
use log::{info, warn};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<UserId, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Loads from `source` only when nothing is cached yet.
    ///
    /// Returns `false` when a load was attempted and failed.
    pub fn ensure_loaded(&mut self, source: &dyn UserSource) -> bool {
        if !self.users.is_empty() {
            return true;
        }
        match self.reload(source) {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    "event=user_directory_load module=repo status=degraded error_kind={} retryable={}",
                    err.kind, err.retryable
                );
                false
            }
        }
    }

    /// Replaces the cache with a fresh listing; keeps the old one on failure.
    pub fn reload(&mut self, source: &dyn UserSource) -> RemoteResult<usize> {
        let users = source.list_users()?;
        self.users = users.into_iter().map(|user| (user.id, user)).collect();
        info!(
            "event=user_directory_load module=repo status=ok count={}",
            self.users.len()
        );
        Ok(self.users.len())
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn resolve(&self, id: UserId) -> UserRef {
        match self.users.get(&id) {
            Some(user) => UserRef::Resolved(user.clone()),
            None => UserRef::Unresolved(id),
        }
    }

    /// Users that could still be invited to `topic`, sorted by name.
    pub fn available_for(&self, topic: &Topic) -> Vec<&User> {
        let mut users: Vec<&User> = self
            .users
            .values()
            .filter(|user| !topic.is_member(user.id))
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}
