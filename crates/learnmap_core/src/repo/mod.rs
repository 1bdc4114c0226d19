//! In-memory entity stores.
//!
//! # Responsibility
//! - Hold the canonical flat Topic/Goal/Task collections for one session.
//! - Keep parent id lists and child back-references in step on every write.
//! - Rebuild nested views only when a consumer asks for one.
//!
//! # Invariants
//! - A goal listed in `topic.goal_ids` has `goal.topic_id == topic.id`, and
//!   every stored goal is listed by its topic; same for tasks and goals.
//! - Writes here never talk to the remote; callers pass confirmed records.

pub mod collection;
pub mod goal_repo;
pub mod task_repo;
pub mod topic_repo;
pub mod user_directory;

use crate::model::goal::{Goal, GoalId};
use crate::model::task::{Task, TaskId};
use crate::model::topic::{Topic, TopicId};
use crate::model::tree::{GoalNode, TopicTree};
use goal_repo::GoalRepo;
use task_repo::TaskRepo;
use topic_repo::TopicRepo;

/// Broken reference found by `Stores::verify_links`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkIssue {
    MissingGoal { topic_id: TopicId, goal_id: GoalId },
    GoalParentMismatch { goal_id: GoalId, listed_by: TopicId, points_at: TopicId },
    UnlistedGoal { goal_id: GoalId, topic_id: TopicId },
    MissingTask { goal_id: GoalId, task_id: TaskId },
    TaskParentMismatch { task_id: TaskId, listed_by: GoalId, points_at: GoalId },
    UnlistedTask { task_id: TaskId, goal_id: GoalId },
}

#[derive(Debug, Default)]
pub struct Stores {
    pub topics: TopicRepo,
    pub goals: GoalRepo,
    pub tasks: TaskRepo,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk replacement after a full fetch.
    pub(crate) fn replace_all(&mut self, topics: Vec<Topic>, goals: Vec<Goal>, tasks: Vec<Task>) {
        self.topics.replace_all(topics);
        self.goals.replace_all(goals);
        self.tasks.replace_all(tasks);
    }

    /// Swaps one topic and everything under it for a freshly fetched copy.
    pub(crate) fn replace_topic_subtree(&mut self, topic: Topic, goals: Vec<Goal>, tasks: Vec<Task>) {
        self.remove_topic_subtree(topic.id);
        self.topics.upsert(topic);
        for goal in goals {
            self.goals.upsert(goal);
        }
        for task in tasks {
            self.tasks.upsert(task);
        }
    }

    pub(crate) fn remove_topic_subtree(&mut self, topic_id: TopicId) {
        let goal_ids = self.goals.remove_for_topic(topic_id);
        self.tasks.remove_for_goals(&goal_ids);
    }

    /// Stores a confirmed goal and lists it under its topic.
    pub(crate) fn attach_goal(&mut self, goal: Goal) {
        if let Some(topic) = self.topics.get_mut(goal.topic_id) {
            if !topic.goal_ids.contains(&goal.id) {
                topic.goal_ids.push(goal.id);
            }
        }
        self.goals.upsert(goal);
    }

    /// Stores a confirmed task and lists it under its goal.
    pub(crate) fn attach_task(&mut self, task: Task) {
        if let Some(goal) = self.goals.get_mut(task.goal_id) {
            if !goal.task_ids.contains(&task.id) {
                goal.task_ids.push(task.id);
            }
        }
        self.tasks.upsert(task);
    }

    /// Re-sorts `topic.goal_ids` by the goals' `order_index`, keeping ties
    /// in their current order.
    pub(crate) fn sort_goal_ids(&mut self, topic_id: TopicId) {
        let Some(topic) = self.topics.get(topic_id) else {
            return;
        };
        let mut ids = topic.goal_ids.clone();
        ids.sort_by_key(|id| self.goals.get(*id).map_or(i64::MAX, |goal| goal.order_index));
        if let Some(topic) = self.topics.get_mut(topic_id) {
            topic.goal_ids = ids;
        }
    }

    pub(crate) fn sort_task_ids(&mut self, goal_id: GoalId) {
        let Some(goal) = self.goals.get(goal_id) else {
            return;
        };
        let mut ids = goal.task_ids.clone();
        ids.sort_by_key(|id| self.tasks.get(*id).map_or(i64::MAX, |task| task.order_index));
        if let Some(goal) = self.goals.get_mut(goal_id) {
            goal.task_ids = ids;
        }
    }

    /// All of a topic's goals, archived included, in list order.
    pub fn goals_in_order(&self, topic_id: TopicId) -> Vec<Goal> {
        match self.topics.get(topic_id) {
            Some(topic) => self.goals.for_topic(topic).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn tasks_in_order(&self, goal_id: GoalId) -> Vec<Task> {
        match self.goals.get(goal_id) {
            Some(goal) => self.tasks.for_goal(goal).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn active_goals(&self, topic_id: TopicId) -> Vec<&Goal> {
        match self.topics.get(topic_id) {
            Some(topic) => self.goals.active_for_topic(topic).collect(),
            None => Vec::new(),
        }
    }

    /// Active tasks under the topic's active goals, in goal then task order.
    pub fn active_topic_tasks(&self, topic_id: TopicId) -> Vec<&Task> {
        self.active_goals(topic_id)
            .into_iter()
            .flat_map(|goal| self.tasks.active_for_goal(goal))
            .collect()
    }

    pub fn topic_tree(&self, topic_id: TopicId) -> Option<TopicTree> {
        let topic = self.topics.get(topic_id)?;
        let goals = self
            .goals
            .for_topic(topic)
            .map(|goal| GoalNode {
                goal: goal.clone(),
                tasks: self.tasks.for_goal(goal).cloned().collect(),
            })
            .collect();
        Some(TopicTree {
            topic: topic.clone(),
            goals,
        })
    }

    /// Checks the parent/child link invariant across all three collections.
    pub fn verify_links(&self) -> Vec<LinkIssue> {
        let mut issues = Vec::new();

        for topic in self.topics.iter() {
            for goal_id in &topic.goal_ids {
                match self.goals.get(*goal_id) {
                    None => issues.push(LinkIssue::MissingGoal {
                        topic_id: topic.id,
                        goal_id: *goal_id,
                    }),
                    Some(goal) if goal.topic_id != topic.id => {
                        issues.push(LinkIssue::GoalParentMismatch {
                            goal_id: goal.id,
                            listed_by: topic.id,
                            points_at: goal.topic_id,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        for goal in self.goals.iter() {
            let listed = self
                .topics
                .get(goal.topic_id)
                .is_some_and(|topic| topic.goal_ids.contains(&goal.id));
            if !listed {
                issues.push(LinkIssue::UnlistedGoal {
                    goal_id: goal.id,
                    topic_id: goal.topic_id,
                });
            }
            for task_id in &goal.task_ids {
                match self.tasks.get(*task_id) {
                    None => issues.push(LinkIssue::MissingTask {
                        goal_id: goal.id,
                        task_id: *task_id,
                    }),
                    Some(task) if task.goal_id != goal.id => {
                        issues.push(LinkIssue::TaskParentMismatch {
                            task_id: task.id,
                            listed_by: goal.id,
                            points_at: task.goal_id,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        for task in self.tasks.iter() {
            let listed = self
                .goals
                .get(task.goal_id)
                .is_some_and(|goal| goal.task_ids.contains(&task.id));
            if !listed {
                issues.push(LinkIssue::UnlistedTask {
                    task_id: task.id,
                    goal_id: task.goal_id,
                });
            }
        }
        issues
    }

    pub fn clear(&mut self) {
        self.topics.clear();
        self.goals.clear();
        self.tasks.clear();
    }
}
