mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::{noon, seed_math, Math, World};
use learnmap_core::{
    CoreError, CycleConfig, CycleType, GoalPath, TaskConfig, TaskDraft, TaskPath, TaskStatus,
    TopicService,
};

fn streak_task(math: &Math) -> TaskPath {
    GoalPath::new(math.topic, math.goals[1]).task(math.tasks[1][0])
}

fn amount_task(math: &Math) -> TaskPath {
    GoalPath::new(math.topic, math.goals[1]).task(math.tasks[1][1])
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 22).unwrap() + Duration::days(offset)
}

fn setup() -> (World, Math, TopicService) {
    let world = World::new();
    let math = seed_math(&world.remote, world.alice.id);
    let mut client = world.client(world.alice.id);
    client.fetch_topics().unwrap();
    (world, math, client)
}

/// Checks in on each day offset (relative to the seeded noon), in order.
fn check_in_on(world: &World, client: &mut TopicService, path: TaskPath, offsets: &[i64]) -> u64 {
    let mut version = client.stores().tasks.get(path.task_id).unwrap().version;
    for offset in offsets {
        world.clock.set(noon() + Duration::days(*offset));
        version = client.check_in(path, version).unwrap().version;
    }
    world.clock.set(noon());
    version
}

#[test]
fn repeated_check_in_on_the_same_day_is_a_no_op() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);

    let first = client.check_in(path, 1).unwrap();
    assert_eq!(first.version, 2);
    assert_eq!(first.status, TaskStatus::InProgress);
    let streak_before = client.task_progress(path).unwrap().current_streak;
    let calls = world.remote.mutation_calls().unwrap();

    world.clock.advance(Duration::hours(3));
    let second = client.check_in(path, 2).unwrap();
    assert_eq!(second.version, 2);
    assert_eq!(second.actions.len(), 1);
    assert_eq!(world.remote.mutation_calls().unwrap(), calls);

    let progress = client.task_progress(path).unwrap();
    assert_eq!(progress.check_in_dates, vec![day(0)]);
    assert_eq!(progress.current_streak, streak_before);
    assert!(progress.checked_in_today);
}

#[test]
fn consecutive_days_build_a_streak() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);
    check_in_on(&world, &mut client, path, &[-2, -1, 0]);

    let progress = client.task_progress(path).unwrap();
    assert_eq!(progress.current_streak, 3);
    assert_eq!(progress.max_streak, 3);
    // 3 of 7 target days.
    assert_eq!(progress.completion_percent, 43);
}

#[test]
fn a_gap_resets_the_current_streak_but_not_the_best_run() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);
    check_in_on(&world, &mut client, path, &[-5, -4, -3, -1, 0]);

    let progress = client.task_progress(path).unwrap();
    assert_eq!(progress.current_streak, 2);
    assert_eq!(progress.max_streak, 3);
}

#[test]
fn yesterday_keeps_the_streak_until_the_day_after() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);
    check_in_on(&world, &mut client, path, &[-3, -1]);

    assert_eq!(client.task_progress(path).unwrap().current_streak, 1);
    world.clock.set(noon() + Duration::days(1));
    assert_eq!(client.task_progress(path).unwrap().current_streak, 0);
}

#[test]
fn calendar_day_follows_the_reference_offset() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);

    // 23:59 and 00:01 in UTC+8 fall on different calendar days.
    world
        .clock
        .set(Utc.with_ymd_and_hms(2026, 4, 22, 15, 59, 0).unwrap());
    let first = client.check_in(path, 1).unwrap();
    world
        .clock
        .set(Utc.with_ymd_and_hms(2026, 4, 22, 16, 1, 0).unwrap());
    let second = client.check_in(path, first.version).unwrap();

    assert_eq!(second.actions.len(), 2);
    assert_eq!(second.actions[0].action_date, day(0));
    assert_eq!(second.actions[1].action_date, day(1));
    assert_eq!(client.task_progress(path).unwrap().current_streak, 2);
}

#[test]
fn cancel_removes_only_todays_entry() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);
    let version = check_in_on(&world, &mut client, path, &[-1, 0]);

    let cancelled = client.cancel_today_check_in(path, version).unwrap();
    assert_eq!(cancelled.version, version + 1);
    assert_eq!(cancelled.actions.len(), 1);
    assert_eq!(cancelled.actions[0].action_date, day(-1));

    let calls = world.remote.mutation_calls().unwrap();
    let again = client.cancel_today_check_in(path, cancelled.version).unwrap();
    assert_eq!(again.version, cancelled.version);
    assert_eq!(world.remote.mutation_calls().unwrap(), calls);
    assert_eq!(client.task_progress(path).unwrap().current_streak, 1);
}

#[test]
fn reset_clears_the_log_and_keeps_status() {
    let (world, math, mut client) = setup();
    let path = streak_task(&math);
    let version = check_in_on(&world, &mut client, path, &[-2, -1, 0]);

    let reset = client.reset_progress(path, version).unwrap();
    assert!(reset.actions.is_empty());
    assert_eq!(reset.status, TaskStatus::InProgress);
    let progress = client.task_progress(path).unwrap();
    assert_eq!(progress.current_streak, 0);
    assert_eq!(progress.max_streak, 0);
    assert_eq!(progress.completion_percent, 0);

    let stored = world.remote.task_record(path.task_id).unwrap().unwrap();
    assert!(stored.actions.is_empty());
}

#[test]
fn amounts_accumulate_with_the_task_unit() {
    let (world, math, mut client) = setup();
    let path = amount_task(&math);

    let first = client.add_amount(path, 1, 30.0, None).unwrap();
    world.clock.advance(Duration::days(1));
    let second = client
        .add_amount(path, first.version, 45.5, Some("min".to_string()))
        .unwrap();
    assert_eq!(second.actions[0].action_data.unit.as_deref(), Some("minutes"));
    assert_eq!(second.actions[1].action_data.unit.as_deref(), Some("min"));

    let progress = client.task_progress(path).unwrap();
    assert!((progress.total_amount - 75.5).abs() < f64::EPSILON);
    assert_eq!(progress.daily_amounts.len(), 2);
    // 75.5 of 120 minutes.
    assert_eq!(progress.completion_percent, 63);

    let calls = world.remote.mutation_calls().unwrap();
    let err = client.add_amount(path, second.version, -5.0, None).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(world.remote.mutation_calls().unwrap(), calls);
}

#[test]
fn actions_must_fit_the_task_type() {
    let (_world, math, mut client) = setup();
    let single = GoalPath::new(math.topic, math.goals[0]).task(math.tasks[0][0]);

    assert!(matches!(
        client.check_in(single, 1).unwrap_err(),
        CoreError::Validation(_)
    ));
    assert!(matches!(
        client.add_amount(streak_task(&math), 1, 5.0, None).unwrap_err(),
        CoreError::Validation(_)
    ));
    assert!(matches!(
        client.check_in(amount_task(&math), 1).unwrap_err(),
        CoreError::Validation(_)
    ));
}

#[test]
fn stale_version_blocks_a_check_in() {
    let (world, math, mut client) = setup();
    let mut other = world.client(world.alice.id);
    other.fetch_topics().unwrap();
    let path = streak_task(&math);

    other.check_in(path, 1).unwrap();
    let err = client.check_in(path, 1).unwrap_err();
    assert!(matches!(
        err,
        CoreError::VersionConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    assert!(client.stores().tasks.get(path.task_id).unwrap().actions.is_empty());
}

#[test]
fn weekly_count_tasks_only_count_the_current_week() {
    let (world, math, mut client) = setup();
    let mut draft = TaskDraft::new("Read aloud", TaskConfig::Count { target_count: 4 });
    draft.cycle_config = Some(CycleConfig {
        cycle_type: CycleType::Weekly,
        cycle_start_date: Some(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()),
    });
    let task = client
        .add_task(GoalPath::new(math.topic, math.goals[0]), draft)
        .unwrap();
    let path = GoalPath::new(math.topic, math.goals[0]).task(task.id);

    // Sunday of the previous week, then Monday and Tuesday of this one.
    check_in_on(&world, &mut client, path, &[-3, -2, -1]);
    let progress = client.task_progress(path).unwrap();
    let window = progress.cycle_window.unwrap();
    assert_eq!(window.start, day(-2));
    assert_eq!(window.end, day(4));
    assert_eq!(progress.check_ins_in_window, 2);
    assert_eq!(progress.completion_percent, 50);

    world.clock.set(noon() + Duration::days(5));
    let next_week = client.task_progress(path).unwrap();
    assert_eq!(next_week.check_ins_in_window, 0);
}

#[test]
fn added_counts_stack_within_a_day() {
    let (world, math, mut client) = setup();
    let fractions = GoalPath::new(math.topic, math.goals[0]);
    let task = client
        .add_task(
            fractions,
            TaskDraft::new("Flash cards", TaskConfig::Count { target_count: 5 }),
        )
        .unwrap();
    let path = fractions.task(task.id);

    let first = client.add_count(path, task.version, 2).unwrap();
    assert_eq!(first.version, task.version + 1);
    assert_eq!(first.status, TaskStatus::InProgress);
    let second = client.add_count(path, first.version, 1).unwrap();
    assert_eq!(second.actions.len(), 2);

    let progress = client.task_progress(path).unwrap();
    assert_eq!(progress.total_count, 3);
    assert_eq!(progress.completion_percent, 60);

    client.check_in(path, second.version).unwrap();
    assert_eq!(client.task_progress(path).unwrap().completion_percent, 80);

    let calls = world.remote.mutation_calls().unwrap();
    let current = client.stores().tasks.get(path.task_id).unwrap().version;
    assert!(matches!(
        client.add_count(path, current, 0).unwrap_err(),
        CoreError::Validation(_)
    ));
    assert!(matches!(
        client.add_count(streak_task(&math), 1, 1).unwrap_err(),
        CoreError::Validation(_)
    ));
    assert_eq!(world.remote.mutation_calls().unwrap(), calls);
}
