#[cfg(test)]
#[path = "reminders_test.rs"]
mod tests;

use std::fmt::Display;

use chrono::{NaiveDate, TimeZone};

use crate::models::{Task, TaskStatus};

/// Where an open task stands against its due date, by calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DueStatus {
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
}

impl Display for DueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DueStatus::Overdue { days: 1 } => write!(f, "overdue by 1 day"),
            DueStatus::Overdue { days } => write!(f, "overdue by {} days", days),
            DueStatus::DueToday => write!(f, "due today"),
            DueStatus::DueTomorrow => write!(f, "due tomorrow"),
        }
    }
}

/// Classifies `task` against `today`, reading its due date in `tz`. Done
/// tasks, tasks without a due date and tasks due later than tomorrow have no
/// status.
pub fn due_status<Tz: TimeZone>(task: &Task, today: NaiveDate, tz: &Tz) -> Option<DueStatus> {
    if task.status == TaskStatus::Done {
        return None;
    }
    let due = task.due_date?.with_timezone(tz).date_naive();

    let days = (today - due).num_days();
    match days {
        d if d > 0 => Some(DueStatus::Overdue { days: d }),
        0 => Some(DueStatus::DueToday),
        -1 => Some(DueStatus::DueTomorrow),
        _ => None,
    }
}

/// Every task that needs attention, the most overdue first, then the ones
/// due today, then tomorrow.
pub fn due_tasks<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<(&'a Task, DueStatus)> {
    let mut due = tasks
        .iter()
        .filter_map(|t| due_status(t, today, tz).map(|s| (t, s)))
        .collect::<Vec<_>>();
    due.sort_by(|(a, sa), (b, sb)| {
        let by_status = match (sa, sb) {
            (DueStatus::Overdue { days: x }, DueStatus::Overdue { days: y }) => y.cmp(x),
            _ => sa.cmp(sb),
        };
        by_status.then_with(|| a.title.cmp(&b.title))
    });
    due
}
