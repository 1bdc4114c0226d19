//! Goal collection, reached through a verified parent topic.
//!
//! # Invariants
//! - Parent-scoped queries follow the topic's `goal_ids` order and drop any
//!   goal whose `topic_id` does not point back at that topic.

use crate::model::goal::{Goal, GoalId, GoalStatus};
use crate::model::topic::{Topic, TopicId};
use crate::repo::collection::{Collection, Entity};
use uuid::Uuid;

pub type GoalRepo = Collection<Goal>;

impl Entity for Goal {
    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        Goal::is_active(self)
    }
}

impl Collection<Goal> {
    pub fn for_topic<'a>(&'a self, topic: &'a Topic) -> impl Iterator<Item = &'a Goal> + 'a {
        topic
            .goal_ids
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(move |goal| goal.topic_id == topic.id)
    }

    pub fn active_for_topic<'a>(&'a self, topic: &'a Topic) -> impl Iterator<Item = &'a Goal> + 'a {
        self.for_topic(topic).filter(|goal| goal.is_active())
    }

    pub fn with_status_for_topic<'a>(&'a self, topic: &'a Topic, status: GoalStatus) -> Vec<&'a Goal> {
        self.for_topic(topic)
            .filter(|goal| goal.status == status)
            .collect()
    }

    /// Drops every goal pointing at `topic_id`; returns their ids.
    pub(crate) fn remove_for_topic(&mut self, topic_id: TopicId) -> Vec<GoalId> {
        let removed: Vec<GoalId> = self
            .iter()
            .filter(|goal| goal.topic_id == topic_id)
            .map(|goal| goal.id)
            .collect();
        self.retain(|goal| goal.topic_id != topic_id);
        removed
    }
}
