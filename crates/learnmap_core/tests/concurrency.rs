mod common;

use common::{seed_math, World};
use learnmap_core::sync::records::TopicPatch;
use learnmap_core::{CoreError, EntityKind, GoalPath, TopicDraft, TopicStatus};
use uuid::Uuid;

fn retitle(title: &str) -> TopicPatch {
    TopicPatch {
        title: Some(title.to_string()),
        ..TopicPatch::default()
    }
}

#[test]
fn successful_update_bumps_version_by_one() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let updated = client.update_topic(math.topic, 1, retitle("Algebra")).unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.title, "Algebra");
    assert_eq!(client.topic(math.topic).unwrap().version, 2);
    assert_eq!(updated.goal_ids, math.goals);

    let err = client.update_topic(math.topic, 1, retitle("Geometry")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::VersionConflict {
            kind: EntityKind::Topic,
            expected: 1,
            actual: 2,
            ..
        }
    ));
}

#[test]
fn stale_local_version_is_rejected_without_a_remote_call() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let calls_before = world.remote.mutation_calls().unwrap();
    let err = client.update_topic(math.topic, 7, retitle("Algebra")).unwrap_err();
    assert!(err.needs_refresh());
    assert_eq!(world.remote.mutation_calls().unwrap(), calls_before);
    assert_eq!(world.remote.topic_record(math.topic).unwrap().unwrap().title, "Math");
}

#[test]
fn two_clients_racing_on_the_same_topic() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client_a = world.client(world.alice.id);
    let mut client_b = world.client(world.alice.id);
    client_a.fetch_topics().unwrap();
    client_b.fetch_topics().unwrap();

    let confirmed = client_b.update_topic(math.topic, 1, retitle("Math II")).unwrap();
    assert_eq!(confirmed.version, 2);

    let err = client_a
        .update_topic(math.topic, 1, retitle("Mathematics"))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::VersionConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert!(err.user_message().contains("Refresh and reapply"));
    assert_eq!(world.remote.topic_record(math.topic).unwrap().unwrap().title, "Math II");
    // The loser's local copy is untouched until it refreshes.
    assert_eq!(client_a.topic(math.topic).unwrap().title, "Math");

    let refreshed = client_a.refresh_topic(math.topic).unwrap();
    assert_eq!(refreshed.version, 2);
    assert_eq!(refreshed.title, "Math II");
    let retried = client_a
        .update_topic(math.topic, 2, retitle("Mathematics"))
        .unwrap();
    assert_eq!(retried.version, 3);
    assert_eq!(world.remote.topic_record(math.topic).unwrap().unwrap().title, "Mathematics");
}

#[test]
fn transport_failure_leaves_local_state_untouched() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();
    let before = client.topic(math.topic).unwrap().clone();

    world.remote.set_offline(true).unwrap();
    let err = client.update_topic(math.topic, 1, retitle("Algebra")).unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)));
    assert!(err.is_retryable());
    assert!(!err.needs_refresh());
    assert_eq!(client.topic(math.topic).unwrap(), &before);

    world.remote.set_offline(false).unwrap();
    let updated = client.update_topic(math.topic, 1, retitle("Algebra")).unwrap();
    assert_eq!(updated.version, 2);
}

#[test]
fn failed_fetch_keeps_previous_stores() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    world.remote.set_offline(true).unwrap();
    assert!(client.fetch_topics().is_err());
    assert!(client.topic(math.topic).is_some());
    assert_eq!(client.stores().tasks.len(), 5);
}

#[test]
fn validation_fails_before_any_remote_call() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let empty = client
        .update_topic(math.topic, 1, TopicPatch::default())
        .unwrap_err();
    assert!(matches!(empty, CoreError::Validation(_)));
    let blank = client.update_topic(math.topic, 1, retitle("  ")).unwrap_err();
    assert!(matches!(blank, CoreError::Validation(_)));
    assert_eq!(world.remote.mutation_calls().unwrap(), 0);

    assert!(matches!(
        client.create_topic(TopicDraft::new("")).unwrap_err(),
        CoreError::Validation(_)
    ));
}

#[test]
fn unknown_topic_is_not_found() {
    let world = World::new();
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let missing = Uuid::new_v4();
    let err = client.update_topic(missing, 1, retitle("Ghost")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::Topic,
            ..
        }
    ));
    assert!(matches!(
        client.refresh_topic(missing).unwrap_err(),
        CoreError::NotFound { .. }
    ));
}

#[test]
fn delete_and_restore_use_the_version_gate() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let deleted = client.delete_topic(math.topic, 1).unwrap();
    assert_eq!(deleted.status, TopicStatus::Archived);
    assert_eq!(deleted.version, 2);
    assert!(client.active_topics().is_empty());
    assert_eq!(client.topics().len(), 1);

    assert!(client.restore_topic(math.topic, 1).is_err());
    let restored = client.restore_topic(math.topic, 2).unwrap();
    assert_eq!(restored.status, TopicStatus::Active);
    assert_eq!(restored.version, 3);
    assert_eq!(client.active_topics().len(), 1);
}

#[test]
fn goal_edits_from_two_clients_conflict() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client_a = world.client(world.alice.id);
    let mut client_b = world.client(world.alice.id);
    client_a.fetch_topics().unwrap();
    client_b.fetch_topics().unwrap();
    let path = GoalPath::new(math.topic, math.goals[0]);

    let focused = client_b
        .set_goal_status(path, 1, learnmap_core::GoalStatus::Focus)
        .unwrap();
    assert_eq!(focused.version, 2);

    let err = client_a
        .set_goal_status(path, 1, learnmap_core::GoalStatus::Pause)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::VersionConflict {
            kind: EntityKind::Goal,
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert_eq!(client_a.get_focused_goals(math.topic).len(), 0);
    assert_eq!(client_b.get_focused_goals(math.topic).len(), 1);
}

#[test]
fn created_topic_is_listed_first_at_version_one() {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();

    let created = client.create_topic(TopicDraft::new("  Physics ")).unwrap();
    assert_eq!(created.title, "Physics");
    assert_eq!(created.version, 1);
    assert_eq!(created.owner.id(), world.alice.id);
    assert!(created.owner.is_resolved());

    let titles: Vec<_> = client.topics().iter().map(|topic| topic.id).collect();
    assert_eq!(titles, vec![created.id, math.topic]);

    client.fetch_topics().unwrap();
    assert_eq!(client.topics()[0].id, created.id);
}
