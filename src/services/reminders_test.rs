use chrono::{DateTime, FixedOffset, Utc};

use super::*;
use crate::models::NewTask;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
}

fn task(title: &str, due: Option<&str>, status: TaskStatus) -> Task {
    Task::new(
        "user",
        NewTask {
            title: title.to_string(),
            status,
            due_date: due.map(|d| d.parse::<DateTime<Utc>>().unwrap()),
            ..Default::default()
        },
    )
}

#[test]
fn test_due_status() {
    let cases = [
        ("2025-03-09T10:00:00Z", Some(DueStatus::Overdue { days: 3 })),
        ("2025-03-11T23:59:00Z", Some(DueStatus::Overdue { days: 1 })),
        ("2025-03-12T00:00:00Z", Some(DueStatus::DueToday)),
        ("2025-03-12T23:59:59Z", Some(DueStatus::DueToday)),
        ("2025-03-13T08:00:00Z", Some(DueStatus::DueTomorrow)),
        ("2025-03-14T08:00:00Z", None),
    ];

    for (due, expected) in cases {
        let t = task("t", Some(due), TaskStatus::Todo);
        assert_eq!(due_status(&t, today(), &Utc), expected, "due {}", due);
    }
}

#[test]
fn test_done_and_undated_tasks_are_ignored() {
    let done = task("done", Some("2025-03-01T00:00:00Z"), TaskStatus::Done);
    assert_eq!(due_status(&done, today(), &Utc), None);

    let undated = task("undated", None, TaskStatus::InProgress);
    assert_eq!(due_status(&undated, today(), &Utc), None);
}

#[test]
fn test_due_date_is_read_in_local_time() {
    // 23:30 UTC on the 11th is already the 12th two hours east
    let t = task("t", Some("2025-03-11T23:30:00Z"), TaskStatus::Todo);
    let east = FixedOffset::east_opt(2 * 3600).unwrap();

    assert_eq!(
        due_status(&t, today(), &Utc),
        Some(DueStatus::Overdue { days: 1 })
    );
    assert_eq!(due_status(&t, today(), &east), Some(DueStatus::DueToday));
}

#[test]
fn test_due_tasks_order() {
    let tasks = vec![
        task("tomorrow", Some("2025-03-13T09:00:00Z"), TaskStatus::Todo),
        task("late 1", Some("2025-03-11T09:00:00Z"), TaskStatus::Todo),
        task("later", Some("2025-04-01T09:00:00Z"), TaskStatus::Todo),
        task("today", Some("2025-03-12T09:00:00Z"), TaskStatus::InProgress),
        task("late 5", Some("2025-03-07T09:00:00Z"), TaskStatus::Todo),
        task("finished", Some("2025-03-07T09:00:00Z"), TaskStatus::Done),
    ];

    let due = due_tasks(&tasks, today(), &Utc);
    let got = due
        .iter()
        .map(|(t, s)| (t.title.as_str(), *s))
        .collect::<Vec<_>>();
    assert_eq!(
        got,
        vec![
            ("late 5", DueStatus::Overdue { days: 5 }),
            ("late 1", DueStatus::Overdue { days: 1 }),
            ("today", DueStatus::DueToday),
            ("tomorrow", DueStatus::DueTomorrow),
        ]
    );
}

#[test]
fn test_due_status_display() {
    assert_eq!(DueStatus::Overdue { days: 1 }.to_string(), "overdue by 1 day");
    assert_eq!(DueStatus::Overdue { days: 4 }.to_string(), "overdue by 4 days");
    assert_eq!(DueStatus::DueToday.to_string(), "due today");
    assert_eq!(DueStatus::DueTomorrow.to_string(), "due tomorrow");
}
