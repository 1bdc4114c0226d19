//! In-process remote source.
//!
//! # Responsibility
//! - Serve nested topic payloads and apply version-gated patches the way the
//!   hosted backend does, for tests, demos and offline tooling.
//!
//! # Invariants
//! - The server owns `version` and `updated_at`: inserts start at 1 and every
//!   applied patch adds exactly 1.
//! - A stale expected version is answered with `Mutation::Conflict` and
//!   leaves the stored row untouched.
//! - Nested children are served in `order_index` order, ties by insertion.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::GoalId;
use crate::model::task::TaskId;
use crate::model::topic::TopicId;
use crate::model::user::{User, UserId};
use crate::sync::records::{GoalPatch, GoalRecord, TaskPatch, TaskRecord, TopicPatch, TopicRecord};
use crate::sync::remote::{Mutation, RemoteError, RemoteResult, RemoteSource, UserSource};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct RemoteState {
    topics: Vec<TopicRecord>,
    goals: Vec<GoalRecord>,
    tasks: Vec<TaskRecord>,
    users: Vec<User>,
    offline: bool,
    users_offline: bool,
    mutation_calls: usize,
}

pub struct MemoryRemote {
    state: Mutex<RemoteState>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
            clock,
        }
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, RemoteState>> {
        self.state
            .lock()
            .map_err(|_| RemoteError::server("remote state lock poisoned"))
    }

    fn online(&self) -> RemoteResult<MutexGuard<'_, RemoteState>> {
        let state = self.lock()?;
        if state.offline {
            return Err(RemoteError::network("remote unreachable"));
        }
        Ok(state)
    }

    /// Makes every topic/goal/task call fail with a retryable network error.
    pub fn set_offline(&self, offline: bool) -> RemoteResult<()> {
        self.lock()?.offline = offline;
        Ok(())
    }

    pub fn set_users_offline(&self, offline: bool) -> RemoteResult<()> {
        self.lock()?.users_offline = offline;
        Ok(())
    }

    pub fn add_user(&self, user: User) -> RemoteResult<()> {
        self.lock()?.users.push(user);
        Ok(())
    }

    /// Stores a row as-is, bypassing version assignment.
    pub fn seed_topic(&self, record: TopicRecord) -> RemoteResult<()> {
        self.lock()?.topics.push(record);
        Ok(())
    }

    pub fn seed_goal(&self, record: GoalRecord) -> RemoteResult<()> {
        self.lock()?.goals.push(record);
        Ok(())
    }

    pub fn seed_task(&self, record: TaskRecord) -> RemoteResult<()> {
        self.lock()?.tasks.push(record);
        Ok(())
    }

    pub fn topic_record(&self, id: TopicId) -> RemoteResult<Option<TopicRecord>> {
        Ok(self.lock()?.topics.iter().find(|row| row.id == id).cloned())
    }

    pub fn goal_record(&self, id: GoalId) -> RemoteResult<Option<GoalRecord>> {
        Ok(self.lock()?.goals.iter().find(|row| row.id == id).cloned())
    }

    pub fn task_record(&self, id: TaskId) -> RemoteResult<Option<TaskRecord>> {
        Ok(self.lock()?.tasks.iter().find(|row| row.id == id).cloned())
    }

    /// Number of `update_*` calls received, conflicts included.
    pub fn mutation_calls(&self) -> RemoteResult<usize> {
        Ok(self.lock()?.mutation_calls)
    }
}

fn to_value<T: Serialize>(record: &T) -> RemoteResult<Value> {
    serde_json::to_value(record).map_err(|err| RemoteError::decode(err.to_string()))
}

impl RemoteState {
    fn nested_topic(&self, topic: &TopicRecord) -> RemoteResult<Value> {
        let mut goals: Vec<&GoalRecord> = self
            .goals
            .iter()
            .filter(|goal| goal.topic_id == topic.id)
            .collect();
        goals.sort_by_key(|goal| goal.order_index);

        let mut goal_values = Vec::with_capacity(goals.len());
        for goal in goals {
            let mut tasks: Vec<&TaskRecord> = self
                .tasks
                .iter()
                .filter(|task| task.goal_id == goal.id)
                .collect();
            tasks.sort_by_key(|task| task.order_index);
            let task_values = tasks
                .into_iter()
                .map(to_value)
                .collect::<RemoteResult<Vec<_>>>()?;

            let mut goal_value = to_value(goal)?;
            if let Some(object) = goal_value.as_object_mut() {
                object.insert("tasks".to_string(), Value::Array(task_values));
            }
            goal_values.push(goal_value);
        }

        let mut value = to_value(topic)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("goals".to_string(), Value::Array(goal_values));
        }
        Ok(value)
    }
}

fn is_member(topic: &TopicRecord, user_id: UserId) -> bool {
    topic.owner_id == user_id
        || topic
            .topic_collaborators
            .iter()
            .any(|entry| entry.user_id == user_id)
}

impl UserSource for MemoryRemote {
    fn list_users(&self) -> RemoteResult<Vec<User>> {
        let state = self.lock()?;
        if state.users_offline {
            return Err(RemoteError::network("user directory unreachable"));
        }
        Ok(state.users.clone())
    }
}

impl RemoteSource for MemoryRemote {
    fn fetch_user_topics(&self, user_id: UserId) -> RemoteResult<Vec<Value>> {
        let state = self.online()?;
        state
            .topics
            .iter()
            .filter(|topic| is_member(topic, user_id))
            .map(|topic| state.nested_topic(topic))
            .collect()
    }

    fn fetch_topic(&self, topic_id: TopicId) -> RemoteResult<Option<Value>> {
        let state = self.online()?;
        state
            .topics
            .iter()
            .find(|topic| topic.id == topic_id)
            .map(|topic| state.nested_topic(topic))
            .transpose()
    }

    fn insert_topic(&self, mut record: TopicRecord) -> RemoteResult<TopicRecord> {
        let now = self.clock.now();
        let mut state = self.online()?;
        if state.topics.iter().any(|row| row.id == record.id) {
            return Err(RemoteError::server("duplicate topic id"));
        }
        record.version = 1;
        record.created_at = Some(now);
        record.updated_at = now;
        state.topics.insert(0, record.clone());
        Ok(record)
    }

    fn insert_goal(&self, mut record: GoalRecord) -> RemoteResult<GoalRecord> {
        let now = self.clock.now();
        let mut state = self.online()?;
        if !state.topics.iter().any(|row| row.id == record.topic_id) {
            return Err(RemoteError::server("goal references an unknown topic"));
        }
        if state.goals.iter().any(|row| row.id == record.id) {
            return Err(RemoteError::server("duplicate goal id"));
        }
        record.version = 1;
        record.updated_at = now;
        state.goals.push(record.clone());
        Ok(record)
    }

    fn insert_task(&self, mut record: TaskRecord) -> RemoteResult<TaskRecord> {
        let now = self.clock.now();
        let mut state = self.online()?;
        if !state.goals.iter().any(|row| row.id == record.goal_id) {
            return Err(RemoteError::server("task references an unknown goal"));
        }
        if state.tasks.iter().any(|row| row.id == record.id) {
            return Err(RemoteError::server("duplicate task id"));
        }
        record.version = 1;
        record.updated_at = now;
        state.tasks.push(record.clone());
        Ok(record)
    }

    fn update_topic(
        &self,
        id: TopicId,
        expected_version: u64,
        patch: &TopicPatch,
    ) -> RemoteResult<Mutation<TopicRecord>> {
        let now = self.clock.now();
        let mut state = self.online()?;
        state.mutation_calls += 1;
        let Some(row) = state.topics.iter_mut().find(|row| row.id == id) else {
            return Ok(Mutation::Missing);
        };
        if row.version != expected_version {
            return Ok(Mutation::Conflict {
                actual: row.version,
            });
        }
        patch.apply_to(row);
        row.version += 1;
        row.updated_at = now;
        Ok(Mutation::Applied(row.clone()))
    }

    fn update_goal(
        &self,
        id: GoalId,
        expected_version: u64,
        patch: &GoalPatch,
    ) -> RemoteResult<Mutation<GoalRecord>> {
        let now = self.clock.now();
        let mut state = self.online()?;
        state.mutation_calls += 1;
        let Some(row) = state.goals.iter_mut().find(|row| row.id == id) else {
            return Ok(Mutation::Missing);
        };
        if row.version != expected_version {
            return Ok(Mutation::Conflict {
                actual: row.version,
            });
        }
        patch.apply_to(row);
        row.version += 1;
        row.updated_at = now;
        Ok(Mutation::Applied(row.clone()))
    }

    fn update_task(
        &self,
        id: TaskId,
        expected_version: u64,
        patch: &TaskPatch,
    ) -> RemoteResult<Mutation<TaskRecord>> {
        let now = self.clock.now();
        let mut state = self.online()?;
        state.mutation_calls += 1;
        let Some(row) = state.tasks.iter_mut().find(|row| row.id == id) else {
            return Ok(Mutation::Missing);
        };
        if row.version != expected_version {
            return Ok(Mutation::Conflict {
                actual: row.version,
            });
        }
        patch.apply_to(row);
        row.version += 1;
        row.updated_at = now;
        Ok(Mutation::Applied(row.clone()))
    }
}
