//! Data normalizer: nested server payload to flat store records.
//!
//! # Responsibility
//! - Split `topic.goals[].tasks[]` into three flat lists plus ordered id lists.
//! - Resolve owner and collaborator ids through the user directory.
//! - Compute each topic's completion rate from the records just flattened.
//!
//! # Invariants
//! - One output record per accepted input record, in input order.
//! - A malformed record is skipped with its subtree; the batch continues.
//! - A child naming a different parent than the one it is nested under is
//!   treated as malformed.
//! - Directory load failure degrades to unresolved user refs.

use crate::model::goal::{Goal, GoalId};
use crate::model::task::{Task, TaskId};
use crate::model::topic::Topic;
use crate::model::user::Collaborator;
use crate::repo::user_directory::UserDirectory;
use crate::stats::completion_rate;
use crate::sync::records::{GoalRecord, TaskRecord, TopicRecord};
use crate::sync::remote::UserSource;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTopic {
    pub topic: Topic,
    /// Whole percent over the topic's active goals' active tasks.
    pub completion_rate: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub topics: Vec<NormalizedTopic>,
    pub goals: Vec<Goal>,
    pub tasks: Vec<Task>,
    /// Records dropped as malformed, counted once per dropped record.
    pub skipped: usize,
}

impl NormalizedBatch {
    /// Splits into the three store collections.
    pub fn into_parts(self) -> (Vec<Topic>, Vec<Goal>, Vec<Task>) {
        let topics = self.topics.into_iter().map(|entry| entry.topic).collect();
        (topics, self.goals, self.tasks)
    }
}

pub struct Normalizer<'a> {
    directory: &'a mut UserDirectory,
    source: &'a dyn UserSource,
}

impl<'a> Normalizer<'a> {
    pub fn new(directory: &'a mut UserDirectory, source: &'a dyn UserSource) -> Self {
        Self { directory, source }
    }

    pub fn normalize(&mut self, payload: Vec<Value>) -> NormalizedBatch {
        self.directory.ensure_loaded(self.source);

        let mut batch = NormalizedBatch::default();
        let mut seen = HashSet::new();
        for value in payload {
            self.normalize_topic(value, &mut seen, &mut batch);
        }

        info!(
            "event=normalize module=sync status=ok topics={} goals={} tasks={} skipped={}",
            batch.topics.len(),
            batch.goals.len(),
            batch.tasks.len(),
            batch.skipped
        );
        batch
    }

    fn normalize_topic(&self, value: Value, seen: &mut HashSet<Uuid>, batch: &mut NormalizedBatch) {
        let (value, goal_values) = split_children(value, "goals");
        let record: TopicRecord = match decode(value, "topic") {
            Some(record) => record,
            None => {
                batch.skipped += 1;
                return;
            }
        };
        if !seen.insert(record.id) {
            skip("topic", "duplicate_id");
            batch.skipped += 1;
            return;
        }

        let goal_start = batch.goals.len();
        let task_start = batch.tasks.len();
        let mut goal_ids = Vec::new();
        for goal_value in goal_values {
            let Some(value) = adopt(goal_value, "topic_id", record.id, "goal") else {
                batch.skipped += 1;
                continue;
            };
            if let Some(goal_id) = self.normalize_goal(value, seen, batch) {
                goal_ids.push(goal_id);
            }
        }

        let goals = &batch.goals[goal_start..];
        let rate = completion_rate(
            batch.tasks[task_start..]
                .iter()
                .filter(|task| task.is_active())
                .filter(|task| goals.iter().any(|goal| goal.id == task.goal_id && goal.is_active())),
        );

        batch.topics.push(NormalizedTopic {
            topic: topic_from_record(record, goal_ids, self.directory),
            completion_rate: rate,
        });
    }

    fn normalize_goal(
        &self,
        value: Value,
        seen: &mut HashSet<Uuid>,
        batch: &mut NormalizedBatch,
    ) -> Option<GoalId> {
        let (value, task_values) = split_children(value, "tasks");
        let Some(record) = decode::<GoalRecord>(value, "goal") else {
            batch.skipped += 1;
            return None;
        };
        if !seen.insert(record.id) {
            skip("goal", "duplicate_id");
            batch.skipped += 1;
            return None;
        }

        let mut task_ids = Vec::new();
        for task_value in task_values {
            let Some(value) = adopt(task_value, "goal_id", record.id, "task") else {
                batch.skipped += 1;
                continue;
            };
            if let Some(task_id) = self.normalize_task(value, seen, batch) {
                task_ids.push(task_id);
            }
        }

        let id = record.id;
        batch
            .goals
            .push(goal_from_record(record, task_ids, self.directory));
        Some(id)
    }

    fn normalize_task(
        &self,
        value: Value,
        seen: &mut HashSet<Uuid>,
        batch: &mut NormalizedBatch,
    ) -> Option<TaskId> {
        let Some(record) = decode::<TaskRecord>(value, "task") else {
            batch.skipped += 1;
            return None;
        };
        if record.check_consistency().is_err() {
            skip("task", "config_mismatch");
            batch.skipped += 1;
            return None;
        }
        if !seen.insert(record.id) {
            skip("task", "duplicate_id");
            batch.skipped += 1;
            return None;
        }
        let id = record.id;
        batch.tasks.push(task_from_record(record, self.directory));
        Some(id)
    }
}

fn skip(level: &str, reason: &str) {
    warn!("event=normalize_skip module=sync status=skipped level={level} reason={reason}");
}

fn decode<T: DeserializeOwned>(value: Value, level: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(_) => {
            skip(level, "decode");
            None
        }
    }
}

/// Detaches the nested child array under `key`; a missing key means no children.
fn split_children(mut value: Value, key: &str) -> (Value, Vec<Value>) {
    let children = match value.as_object_mut().and_then(|object| object.remove(key)) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    (value, children)
}

/// Fills in the parent back-reference, rejecting a child that names another parent.
fn adopt(mut value: Value, key: &str, parent_id: Uuid, level: &str) -> Option<Value> {
    let Some(object) = value.as_object_mut() else {
        skip(level, "not_an_object");
        return None;
    };
    match object.get(key) {
        None | Some(Value::Null) => {
            object.insert(key.to_string(), Value::String(parent_id.to_string()));
        }
        Some(Value::String(raw)) if Uuid::parse_str(raw).ok() == Some(parent_id) => {}
        Some(_) => {
            skip(level, "parent_mismatch");
            return None;
        }
    }
    Some(value)
}

pub(crate) fn topic_from_record(
    record: TopicRecord,
    goal_ids: Vec<GoalId>,
    directory: &UserDirectory,
) -> Topic {
    let collaborators = record
        .topic_collaborators
        .iter()
        .map(|entry| Collaborator {
            user: directory.resolve(entry.user_id),
            permission: entry.permission,
            invited_at: entry.invited_at,
        })
        .collect();
    Topic {
        id: record.id,
        title: record.title,
        description: record.description,
        subject: record.subject,
        status: record.status,
        version: record.version,
        owner: directory.resolve(record.owner_id),
        collaborators,
        goal_ids,
        show_avatars: record.show_avatars,
        is_collaborative: record.is_collaborative,
        reference_info: record.reference_info,
        template_id: record.template_id,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub(crate) fn goal_from_record(
    record: GoalRecord,
    task_ids: Vec<TaskId>,
    directory: &UserDirectory,
) -> Goal {
    Goal {
        id: record.id,
        topic_id: record.topic_id,
        title: record.title,
        description: record.description,
        status: record.status,
        priority: record.priority,
        version: record.version,
        owner: record.owner_id.map(|id| directory.resolve(id)),
        collaborators: record
            .collaborator_ids
            .iter()
            .map(|id| directory.resolve(*id))
            .collect(),
        task_ids,
        need_help: record.need_help,
        help_message: record.help_message,
        reply_message: record.reply_message,
        reply_at: record.reply_at,
        order_index: record.order_index,
        updated_at: record.updated_at,
    }
}

pub(crate) fn task_from_record(record: TaskRecord, directory: &UserDirectory) -> Task {
    Task {
        id: record.id,
        goal_id: record.goal_id,
        title: record.title,
        description: record.description,
        status: record.status,
        priority: record.priority,
        task_config: record.task_config,
        cycle_config: record.cycle_config,
        actions: record.actions,
        version: record.version,
        owner: record.owner_id.map(|id| directory.resolve(id)),
        collaborators: record
            .collaborator_ids
            .iter()
            .map(|id| directory.resolve(*id))
            .collect(),
        need_help: record.need_help,
        help_message: record.help_message,
        reply_message: record.reply_message,
        reply_at: record.reply_at,
        completed_at: record.completed_at,
        order_index: record.order_index,
        updated_at: record.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{adopt, split_children};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn split_children_tolerates_missing_or_odd_arrays() {
        let (rest, children) = split_children(json!({"id": 1, "goals": [{"a": 1}]}), "goals");
        assert_eq!(children.len(), 1);
        assert!(rest.get("goals").is_none());

        let (_, children) = split_children(json!({"id": 1, "goals": null}), "goals");
        assert!(children.is_empty());
    }

    #[test]
    fn adopt_fills_or_checks_parent_id() {
        let parent = Uuid::new_v4();
        let filled = adopt(json!({"title": "x"}), "topic_id", parent, "goal").unwrap();
        assert_eq!(filled["topic_id"], json!(parent.to_string()));

        let same = json!({"topic_id": parent.to_string()});
        assert!(adopt(same, "topic_id", parent, "goal").is_some());

        let other = json!({"topic_id": Uuid::new_v4().to_string()});
        assert!(adopt(other, "topic_id", parent, "goal").is_none());
        assert!(adopt(json!([1, 2]), "topic_id", parent, "goal").is_none());
    }
}
