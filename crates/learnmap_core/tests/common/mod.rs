#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use learnmap_core::model::topic::ReferenceInfo;
use learnmap_core::sync::records::{GoalRecord, TaskRecord, TopicRecord};
use learnmap_core::{
    Clock, CoreConfig, GoalStatus, ManualClock, MemoryRemote, Priority, RemoteSource, TaskConfig,
    TaskStatus, TopicService, TopicStatus, User, UserId, UserSource,
};
use std::sync::Arc;
use uuid::Uuid;

/// 2026-04-22 (Wednesday) 12:00 in the default UTC+8 calendar.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 22, 4, 0, 0).unwrap()
}

pub struct World {
    pub remote: Arc<MemoryRemote>,
    pub clock: Arc<ManualClock>,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

impl World {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(noon()));
        let remote = Arc::new(MemoryRemote::with_clock(clock.clone() as Arc<dyn Clock>));
        let alice = User::new(Uuid::new_v4(), "Alice");
        let bob = User::new(Uuid::new_v4(), "Bob");
        let carol = User::new(Uuid::new_v4(), "Carol");
        for user in [&alice, &bob, &carol] {
            remote.add_user(user.clone()).unwrap();
        }
        Self {
            remote,
            clock,
            alice,
            bob,
            carol,
        }
    }

    pub fn client(&self, user_id: UserId) -> TopicService {
        TopicService::new(
            self.remote.clone() as Arc<dyn RemoteSource>,
            self.remote.clone() as Arc<dyn UserSource>,
            user_id,
            &CoreConfig::default(),
        )
        .unwrap()
        .with_clock(self.clock.clone() as Arc<dyn Clock>)
    }
}

pub fn topic_record(title: &str, owner_id: UserId) -> TopicRecord {
    TopicRecord {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        subject: None,
        status: TopicStatus::Active,
        version: 1,
        owner_id,
        topic_collaborators: Vec::new(),
        show_avatars: true,
        is_collaborative: false,
        reference_info: ReferenceInfo::default(),
        template_id: None,
        created_at: Some(noon()),
        updated_at: noon(),
    }
}

pub fn goal_record(topic_id: Uuid, title: &str, order_index: i64) -> GoalRecord {
    GoalRecord {
        id: Uuid::new_v4(),
        topic_id,
        title: title.to_string(),
        description: String::new(),
        status: GoalStatus::Todo,
        priority: Priority::Medium,
        version: 1,
        owner_id: None,
        collaborator_ids: Vec::new(),
        need_help: false,
        help_message: None,
        reply_message: None,
        reply_at: None,
        order_index,
        updated_at: noon(),
    }
}

pub fn task_record(goal_id: Uuid, title: &str, config: TaskConfig, order_index: i64) -> TaskRecord {
    TaskRecord {
        id: Uuid::new_v4(),
        goal_id,
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::Todo,
        priority: Priority::Medium,
        task_type: config.task_type(),
        task_config: config,
        cycle_config: None,
        actions: Vec::new(),
        version: 1,
        owner_id: None,
        collaborator_ids: Vec::new(),
        need_help: false,
        help_message: None,
        reply_message: None,
        reply_at: None,
        completed_at: None,
        order_index,
        updated_at: noon(),
    }
}

/// Ids of the seeded "Math" topic.
pub struct Math {
    pub topic: Uuid,
    pub goals: Vec<Uuid>,
    /// Task ids per goal, in goal order.
    pub tasks: Vec<Vec<Uuid>>,
}

/// Seeds "Math" with two goals: three single tasks, then a streak and an
/// accumulative task.
pub fn seed_math(remote: &MemoryRemote, owner_id: UserId) -> Math {
    let topic = topic_record("Math", owner_id);
    let topic_id = topic.id;
    remote.seed_topic(topic).unwrap();

    let fractions = goal_record(topic_id, "Fractions", 0);
    let habits = goal_record(topic_id, "Daily habits", 1);
    let goals = vec![fractions.id, habits.id];

    let fraction_tasks: Vec<TaskRecord> = (0..3)
        .map(|index| task_record(fractions.id, "Worksheet", TaskConfig::Single, index))
        .collect();
    let habit_tasks = vec![
        task_record(habits.id, "Mental math", TaskConfig::Streak { target_days: 7 }, 0),
        task_record(
            habits.id,
            "Practice time",
            TaskConfig::Accumulative {
                target_amount: 120.0,
                unit: "minutes".to_string(),
            },
            1,
        ),
    ];
    let tasks = vec![
        fraction_tasks.iter().map(|task| task.id).collect(),
        habit_tasks.iter().map(|task| task.id).collect(),
    ];

    remote.seed_goal(fractions).unwrap();
    remote.seed_goal(habits).unwrap();
    for task in fraction_tasks.into_iter().chain(habit_tasks) {
        remote.seed_task(task).unwrap();
    }

    Math {
        topic: topic_id,
        goals,
        tasks,
    }
}
