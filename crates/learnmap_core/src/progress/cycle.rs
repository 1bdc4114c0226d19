//! Weekly cycle windows for recurring count tasks.

use crate::clock::CalendarPolicy;
use crate::model::task::{CycleConfig, CycleType};
use chrono::{Duration, NaiveDate};

/// Inclusive Monday..Sunday span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleWindow {
    pub fn week_of(date: NaiveDate) -> Self {
        let start = CalendarPolicy::week_start(date);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Week containing `today`, anchored on the Monday before `anchor`.
///
/// Before the anchored cycle begins, the first cycle week is returned.
pub fn weekly_window(anchor: Option<NaiveDate>, today: NaiveDate) -> CycleWindow {
    match anchor.map(CalendarPolicy::week_start) {
        Some(first_monday) if today < first_monday => CycleWindow::week_of(first_monday),
        _ => CycleWindow::week_of(today),
    }
}

/// Window for tasks with a weekly cycle; `None` for non-recurring tasks.
pub fn active_window(cycle: Option<&CycleConfig>, today: NaiveDate) -> Option<CycleWindow> {
    let cycle = cycle?;
    match cycle.cycle_type {
        CycleType::Weekly => Some(weekly_window(cycle.cycle_start_date, today)),
        CycleType::None => None,
    }
}
