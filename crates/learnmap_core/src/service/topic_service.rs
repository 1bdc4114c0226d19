//! Topic service: the single command and query surface of the core.
//!
//! # Responsibility
//! - Own one session's stores and user directory.
//! - Load and refresh state from the remote source through the normalizer.
//! - Answer read-only queries over the stores (derived numbers included).
//!
//! # Invariants
//! - Queries never call the remote and never cache derived numbers.
//! - Children are reached through a parent that lists them.
//! - Commands live in `topic_commands`, `child_commands` and
//!   `progress_commands`; all of them go through `version_gate`.

use crate::clock::{CalendarPolicy, Clock, SystemClock};
use crate::config::{ConfigError, CoreConfig};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::model::goal::{Goal, GoalId, GoalStatus};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::model::topic::{Topic, TopicId};
use crate::model::tree::TopicTree;
use crate::model::user::{User, UserId};
use crate::progress::TaskProgress;
use crate::repo::user_directory::UserDirectory;
use crate::repo::Stores;
use crate::stats::{self, WeeklyStats};
use crate::sync::normalizer::Normalizer;
use crate::sync::remote::{RemoteError, RemoteSource, UserSource};
use crate::service::version_gate::transport;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

/// Goal addressed through its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalPath {
    pub topic_id: TopicId,
    pub goal_id: GoalId,
}

/// Task addressed through its topic and goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPath {
    pub topic_id: TopicId,
    pub goal_id: GoalId,
    pub task_id: TaskId,
}

impl GoalPath {
    pub fn new(topic_id: TopicId, goal_id: GoalId) -> Self {
        Self { topic_id, goal_id }
    }

    pub fn task(self, task_id: TaskId) -> TaskPath {
        TaskPath {
            topic_id: self.topic_id,
            goal_id: self.goal_id,
            task_id,
        }
    }
}

impl TaskPath {
    pub fn goal(self) -> GoalPath {
        GoalPath::new(self.topic_id, self.goal_id)
    }
}

/// Counts from one full fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub topics: usize,
    pub goals: usize,
    pub tasks: usize,
    pub skipped: usize,
}

pub struct TopicService {
    pub(super) remote: Arc<dyn RemoteSource>,
    pub(super) users: Arc<dyn UserSource>,
    pub(super) session_user: UserId,
    pub(super) stores: Stores,
    pub(super) directory: UserDirectory,
    pub(super) calendar: CalendarPolicy,
    pub(super) newly_completed_window: Duration,
    pub(super) clock: Arc<dyn Clock>,
}

impl TopicService {
    /// Creates an empty session for `session_user`.
    ///
    /// # Errors
    /// - Config carries an invalid calendar offset or stats window.
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        users: Arc<dyn UserSource>,
        session_user: UserId,
        config: &CoreConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            remote,
            users,
            session_user,
            stores: Stores::new(),
            directory: UserDirectory::new(),
            calendar: config.calendar()?,
            newly_completed_window: config.newly_completed_window()?,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Drops all session state (logout, test teardown).
    pub fn reset(&mut self) {
        self.stores.clear();
        self.directory.clear();
        info!("event=session_reset module=service status=ok");
    }

    pub fn session_user(&self) -> UserId {
        self.session_user
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn calendar(&self) -> CalendarPolicy {
        self.calendar
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(super) fn today(&self) -> NaiveDate {
        self.calendar.today(self.clock.as_ref())
    }

    /// Replaces every store with the session user's topics.
    ///
    /// Malformed records are skipped and counted; a transport failure leaves
    /// the stores untouched.
    pub fn fetch_topics(&mut self) -> CoreResult<FetchReport> {
        let payload = self
            .remote
            .fetch_user_topics(self.session_user)
            .map_err(|err| transport("topic_fetch", EntityKind::Topic, err))?;

        let batch = Normalizer::new(&mut self.directory, self.users.as_ref()).normalize(payload);
        let report = FetchReport {
            topics: batch.topics.len(),
            goals: batch.goals.len(),
            tasks: batch.tasks.len(),
            skipped: batch.skipped,
        };
        let (topics, goals, tasks) = batch.into_parts();
        self.stores.replace_all(topics, goals, tasks);
        info!(
            "event=topic_fetch module=service status=ok topics={} goals={} tasks={} skipped={}",
            report.topics, report.goals, report.tasks, report.skipped
        );
        Ok(report)
    }

    /// Refetches one topic with its full subtree.
    ///
    /// A topic the server no longer knows is dropped locally and reported as
    /// `NotFound`.
    pub fn refresh_topic(&mut self, topic_id: TopicId) -> CoreResult<Topic> {
        let payload = self
            .remote
            .fetch_topic(topic_id)
            .map_err(|err| transport("topic_refresh", EntityKind::Topic, err))?;
        let Some(value) = payload else {
            self.stores.remove_topic_subtree(topic_id);
            self.stores.topics.remove(topic_id);
            warn!("event=topic_refresh module=service status=error error_code=not_found");
            return Err(CoreError::not_found(EntityKind::Topic, topic_id));
        };

        let batch = Normalizer::new(&mut self.directory, self.users.as_ref()).normalize(vec![value]);
        let (mut topics, goals, tasks) = batch.into_parts();
        let topic = match topics.pop() {
            Some(topic) if topic.id == topic_id => topic,
            _ => {
                let err = RemoteError::decode("refreshed topic payload was malformed");
                return Err(transport("topic_refresh", EntityKind::Topic, err));
            }
        };
        self.stores.replace_topic_subtree(topic.clone(), goals, tasks);
        info!(
            "event=topic_refresh module=service status=ok version={}",
            topic.version
        );
        Ok(topic)
    }

    pub fn topic(&self, topic_id: TopicId) -> Option<&Topic> {
        self.stores.topics.get(topic_id)
    }

    pub fn topics(&self) -> Vec<&Topic> {
        self.stores.topics.iter().collect()
    }

    pub fn active_topics(&self) -> Vec<&Topic> {
        self.stores.topics.active().collect()
    }

    pub fn get_active_goals(&self, topic_id: TopicId) -> Vec<&Goal> {
        self.stores.active_goals(topic_id)
    }

    pub fn goals_by_status(&self, topic_id: TopicId, status: GoalStatus) -> Vec<&Goal> {
        match self.stores.topics.get(topic_id) {
            Some(topic) => self.stores.goals.with_status_for_topic(topic, status),
            None => Vec::new(),
        }
    }

    pub fn get_focused_goals(&self, topic_id: TopicId) -> Vec<&Goal> {
        self.stores
            .active_goals(topic_id)
            .into_iter()
            .filter(|goal| goal.is_focused())
            .collect()
    }

    /// Active tasks of a goal that its topic still lists.
    pub fn get_active_tasks_for_goal(&self, path: GoalPath) -> Vec<&Task> {
        match self.verified_goal(path) {
            Some(goal) => self.stores.tasks.active_for_goal(goal).collect(),
            None => Vec::new(),
        }
    }

    pub fn in_progress_tasks(&self, topic_id: TopicId) -> Vec<&Task> {
        self.stores
            .active_topic_tasks(topic_id)
            .into_iter()
            .filter(|task| task.status == TaskStatus::InProgress)
            .collect()
    }

    pub fn completion_rate(&self, topic_id: TopicId) -> u8 {
        stats::completion_rate(self.stores.active_topic_tasks(topic_id))
    }

    pub fn weekly_stats(&self, topic_id: TopicId) -> WeeklyStats {
        stats::weekly_stats(
            self.stores.active_topic_tasks(topic_id),
            self.now(),
            self.newly_completed_window,
        )
    }

    pub fn need_help_count(&self, topic_id: TopicId) -> usize {
        let goals = self.stores.active_goals(topic_id);
        let tasks = self.stores.active_topic_tasks(topic_id);
        stats::need_help_count(goals, tasks)
    }

    pub fn task_progress(&self, path: TaskPath) -> Option<TaskProgress> {
        let task = self.verified_task(path)?;
        Some(TaskProgress::summarize(task, self.today()))
    }

    pub fn topic_tree(&self, topic_id: TopicId) -> Option<TopicTree> {
        self.stores.topic_tree(topic_id)
    }

    /// Directory users who are neither owner nor collaborator of the topic.
    pub fn available_users(&self, topic_id: TopicId) -> Vec<&User> {
        match self.stores.topics.get(topic_id) {
            Some(topic) => self.directory.available_for(topic),
            None => Vec::new(),
        }
    }

    pub(super) fn verified_goal(&self, path: GoalPath) -> Option<&Goal> {
        let topic = self.stores.topics.get(path.topic_id)?;
        if !topic.goal_ids.contains(&path.goal_id) {
            return None;
        }
        self.stores
            .goals
            .get(path.goal_id)
            .filter(|goal| goal.topic_id == topic.id)
    }

    pub(super) fn verified_task(&self, path: TaskPath) -> Option<&Task> {
        let goal = self.verified_goal(path.goal())?;
        if !goal.task_ids.contains(&path.task_id) {
            return None;
        }
        self.stores
            .tasks
            .get(path.task_id)
            .filter(|task| task.goal_id == goal.id)
    }
}
