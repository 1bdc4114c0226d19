//! Nested read-only views rebuilt from the flat stores.
//!
//! Only consumers that need a tree shape ask for one; the stores never hold
//! embedded children.

use crate::model::goal::Goal;
use crate::model::task::Task;
use crate::model::topic::Topic;

#[derive(Debug, Clone, PartialEq)]
pub struct GoalNode {
    pub goal: Goal,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicTree {
    pub topic: Topic,
    pub goals: Vec<GoalNode>,
}

impl TopicTree {
    pub fn task_count(&self) -> usize {
        self.goals.iter().map(|node| node.tasks.len()).sum()
    }
}
