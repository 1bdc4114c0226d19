//! Task collection, reached through a verified parent goal.

use crate::model::goal::{Goal, GoalId};
use crate::model::task::Task;
use crate::repo::collection::{Collection, Entity};
use uuid::Uuid;

pub type TaskRepo = Collection<Task>;

impl Entity for Task {
    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        Task::is_active(self)
    }
}

impl Collection<Task> {
    pub fn for_goal<'a>(&'a self, goal: &'a Goal) -> impl Iterator<Item = &'a Task> + 'a {
        goal.task_ids
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(move |task| task.goal_id == goal.id)
    }

    pub fn active_for_goal<'a>(&'a self, goal: &'a Goal) -> impl Iterator<Item = &'a Task> + 'a {
        self.for_goal(goal).filter(|task| task.is_active())
    }

    pub(crate) fn remove_for_goals(&mut self, goal_ids: &[GoalId]) {
        self.retain(|task| !goal_ids.contains(&task.goal_id));
    }
}
