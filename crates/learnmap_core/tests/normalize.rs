mod common;

use common::{goal_record, noon, seed_math, task_record, topic_record, World};
use learnmap_core::repo::user_directory::UserDirectory;
use learnmap_core::sync::normalizer::{NormalizedBatch, Normalizer};
use learnmap_core::{Goal, Task, TaskConfig, TaskStatus, UserRef};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn nested(topic: Value, goals: Vec<(Value, Vec<Value>)>) -> Value {
    let mut topic = topic;
    let goals: Vec<Value> = goals
        .into_iter()
        .map(|(mut goal, tasks)| {
            goal["tasks"] = Value::Array(tasks);
            goal
        })
        .collect();
    topic["goals"] = Value::Array(goals);
    topic
}

fn normalize(world: &World, payload: Vec<Value>) -> (NormalizedBatch, UserDirectory) {
    let mut directory = UserDirectory::new();
    let batch = Normalizer::new(&mut directory, world.remote.as_ref()).normalize(payload);
    (batch, directory)
}

#[test]
fn fetch_flattens_into_three_linked_collections() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);

    let report = client.fetch_topics().unwrap();
    assert_eq!((report.topics, report.goals, report.tasks, report.skipped), (1, 2, 5, 0));

    let stores = client.stores();
    let topic = stores.topics.get(math.topic).unwrap();
    assert_eq!(topic.goal_ids, math.goals);
    for (goal_id, task_ids) in math.goals.iter().zip(&math.tasks) {
        assert_eq!(&stores.goals.get(*goal_id).unwrap().task_ids, task_ids);
    }

    // Sum of per-goal task counts equals the tasks whose goal the topic lists.
    let listed: usize = topic
        .goal_ids
        .iter()
        .map(|id| stores.goals.get(*id).unwrap().task_ids.len())
        .sum();
    let reachable = stores
        .tasks
        .iter()
        .filter(|task| topic.goal_ids.contains(&task.goal_id))
        .count();
    assert_eq!(listed, reachable);
    assert!(stores.verify_links().is_empty());
}

#[test]
fn owner_and_collaborators_resolve_through_the_directory() {
    let world = World::new();
    let mut topic = topic_record("Reading", world.alice.id);
    topic.topic_collaborators = vec![learnmap_core::sync::records::CollaboratorRecord {
        user_id: world.bob.id,
        permission: learnmap_core::Permission::Edit,
        invited_at: None,
    }];
    let payload = vec![nested(serde_json::to_value(&topic).unwrap(), Vec::new())];

    let (batch, directory) = normalize(&world, payload);
    assert_eq!(directory.len(), 3);
    let normalized = &batch.topics[0].topic;
    assert_eq!(normalized.owner, UserRef::Resolved(world.alice.clone()));
    assert_eq!(normalized.collaborators[0].user, UserRef::Resolved(world.bob.clone()));
}

#[test]
fn directory_outage_degrades_to_unresolved_users() {
    let world = World::new();
    world.remote.set_users_offline(true).unwrap();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);

    let report = client.fetch_topics().unwrap();
    assert_eq!(report.topics, 1);
    let topic = client.topic(math.topic).unwrap();
    assert_eq!(topic.owner, UserRef::Unresolved(world.alice.id));
    assert!(client.directory().is_empty());

    world.remote.set_users_offline(false).unwrap();
    client.fetch_topics().unwrap();
    assert!(client.topic(math.topic).unwrap().owner.is_resolved());
}

#[test]
fn malformed_records_are_skipped_with_their_subtree() {
    let world = World::new();
    let topic = topic_record("Science", world.alice.id);
    let good_goal = goal_record(topic.id, "Cells", 0);
    let bad_goal = json!({ "id": Uuid::new_v4().to_string(), "title": 42 });
    let good_task = task_record(good_goal.id, "Read", TaskConfig::Single, 0);
    let mut mismatched = task_record(good_goal.id, "Count", TaskConfig::Single, 1);
    mismatched.task_type = learnmap_core::TaskType::Streak;
    let foreign = task_record(Uuid::new_v4(), "Elsewhere", TaskConfig::Single, 2);

    let payload = vec![
        json!({ "title": "no id", "goals": [] }),
        nested(
            serde_json::to_value(&topic).unwrap(),
            vec![
                (
                    serde_json::to_value(&good_goal).unwrap(),
                    vec![
                        serde_json::to_value(&good_task).unwrap(),
                        serde_json::to_value(&mismatched).unwrap(),
                        serde_json::to_value(&foreign).unwrap(),
                    ],
                ),
                (bad_goal, vec![serde_json::to_value(&good_task).unwrap()]),
            ],
        ),
    ];

    let (batch, _) = normalize(&world, payload);
    assert_eq!(batch.topics.len(), 1);
    assert_eq!(batch.goals.len(), 1);
    assert_eq!(batch.tasks.len(), 1);
    // missing topic id, bad goal, type/config mismatch, foreign parent
    assert_eq!(batch.skipped, 4);
    assert_eq!(batch.goals[0].task_ids, vec![good_task.id]);
}

#[test]
fn children_without_back_references_are_adopted() {
    let world = World::new();
    let topic = topic_record("History", world.alice.id);
    let goal = goal_record(topic.id, "Rome", 0);
    let mut goal_value = serde_json::to_value(&goal).unwrap();
    goal_value.as_object_mut().unwrap().remove("topic_id");

    let (batch, _) = normalize(
        &world,
        vec![nested(serde_json::to_value(&topic).unwrap(), vec![(goal_value, Vec::new())])],
    );
    assert_eq!(batch.skipped, 0);
    assert_eq!(batch.goals[0].topic_id, topic.id);
}

#[test]
fn completion_rate_is_computed_per_topic() {
    let world = World::new();
    let topic = topic_record("Art", world.alice.id);
    let goal = goal_record(topic.id, "Sketching", 0);
    let mut done = task_record(goal.id, "Apple", TaskConfig::Single, 0);
    done.status = TaskStatus::Done;
    done.completed_at = Some(noon());
    let todo = task_record(goal.id, "Pear", TaskConfig::Single, 1);
    let mut archived = task_record(goal.id, "Plum", TaskConfig::Single, 2);
    archived.status = TaskStatus::Archived;

    let tasks = [done, todo, archived]
        .iter()
        .map(|task| serde_json::to_value(task).unwrap())
        .collect();
    let (batch, _) = normalize(
        &world,
        vec![nested(
            serde_json::to_value(&topic).unwrap(),
            vec![(serde_json::to_value(&goal).unwrap(), tasks)],
        )],
    );
    assert_eq!(batch.topics[0].completion_rate, 50);
    assert_eq!(batch.tasks.len(), 3);
}

fn rebuild(batch: &NormalizedBatch) -> Vec<(Uuid, Vec<(Uuid, Vec<Uuid>)>)> {
    let goals: HashMap<Uuid, &Goal> = batch.goals.iter().map(|goal| (goal.id, goal)).collect();
    let tasks: HashMap<Uuid, &Task> = batch.tasks.iter().map(|task| (task.id, task)).collect();
    batch
        .topics
        .iter()
        .map(|entry| {
            let children = entry
                .topic
                .goal_ids
                .iter()
                .map(|goal_id| {
                    let goal = goals[goal_id];
                    assert_eq!(goal.topic_id, entry.topic.id);
                    let task_ids = goal
                        .task_ids
                        .iter()
                        .map(|task_id| {
                            assert_eq!(tasks[task_id].goal_id, goal.id);
                            *task_id
                        })
                        .collect();
                    (goal.id, task_ids)
                })
                .collect();
            (entry.topic.id, children)
        })
        .collect()
}

proptest! {
    #[test]
    fn normalize_then_rebuild_preserves_ids_and_order(
        shape in prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 0..4)
    ) {
        let world = World::new();
        let mut expected = Vec::new();
        let mut payload = Vec::new();

        for (topic_index, goal_shapes) in shape.iter().enumerate() {
            let topic = topic_record(&format!("Topic {topic_index}"), world.alice.id);
            let mut goals = Vec::new();
            let mut expected_goals = Vec::new();
            for (goal_index, task_count) in goal_shapes.iter().enumerate() {
                let goal = goal_record(topic.id, "Goal", goal_index as i64);
                let tasks: Vec<_> = (0..*task_count)
                    .map(|task_index| task_record(goal.id, "Task", TaskConfig::Single, task_index as i64))
                    .collect();
                expected_goals.push((goal.id, tasks.iter().map(|task| task.id).collect::<Vec<_>>()));
                goals.push((
                    serde_json::to_value(&goal).unwrap(),
                    tasks.iter().map(|task| serde_json::to_value(task).unwrap()).collect(),
                ));
            }
            expected.push((topic.id, expected_goals));
            payload.push(nested(serde_json::to_value(&topic).unwrap(), goals));
        }

        let (batch, _) = normalize(&world, payload);
        prop_assert_eq!(batch.skipped, 0);
        let ids: HashSet<Uuid> = batch.tasks.iter().map(|task| task.id).collect();
        prop_assert_eq!(ids.len(), batch.tasks.len());
        prop_assert_eq!(rebuild(&batch), expected);
    }
}
