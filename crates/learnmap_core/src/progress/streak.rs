//! Folds over a task's action log.
//!
//! # Invariants
//! - Results depend only on the log and the supplied `today`.
//! - Check-in dates are deduplicated; repeated same-day entries count once.

use crate::model::task::{ActionType, TaskAction};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Sorted, deduplicated check-in days.
pub fn check_in_dates(actions: &[TaskAction]) -> Vec<NaiveDate> {
    actions
        .iter()
        .filter(|action| action.action_type == ActionType::CheckIn)
        .map(|action| action.action_date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Run of consecutive days ending today, or yesterday when today is still open.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let yesterday = today - Duration::days(1);
    let mut cursor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive days anywhere in `dates` (expects sorted input).
pub fn max_streak(dates: &[NaiveDate]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for date in dates {
        run = match previous {
            Some(prev) if *date - prev == Duration::days(1) => run + 1,
            Some(prev) if *date == prev => run,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(*date);
    }
    best
}

/// Counts recorded through `add_count`, per calendar day.
pub fn added_counts(actions: &[TaskAction]) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
    actions
        .iter()
        .filter(|action| action.action_type == ActionType::AddCount)
        .filter_map(|action| action.action_data.count.map(|count| (action.action_date, count)))
}

pub fn total_count(actions: &[TaskAction]) -> u32 {
    added_counts(actions).map(|(_, count)| count).sum()
}

pub fn total_amount(actions: &[TaskAction]) -> f64 {
    amounts(actions).map(|(_, amount)| amount).sum()
}

pub fn daily_amounts(actions: &[TaskAction]) -> BTreeMap<NaiveDate, f64> {
    let mut buckets = BTreeMap::new();
    for (date, amount) in amounts(actions) {
        *buckets.entry(date).or_insert(0.0) += amount;
    }
    buckets
}

fn amounts(actions: &[TaskAction]) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    actions
        .iter()
        .filter(|action| action.action_type == ActionType::AddAmount)
        .filter_map(|action| {
            action
                .action_data
                .amount
                .map(|amount| (action.action_date, amount))
        })
}
