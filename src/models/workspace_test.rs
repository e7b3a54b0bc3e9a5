use chrono::Duration;

use super::*;

fn task(status: TaskStatus) -> Task {
    Task::new(
        "user",
        NewTask {
            title: format!("{:?}", status),
            status,
            ..Default::default()
        },
    )
}

fn note(category: NoteCategory, favorite: bool) -> Note {
    Note::new(
        "user",
        NewNote {
            title: "title".to_string(),
            content: "content".to_string(),
            category,
            is_favorite: favorite,
            ..Default::default()
        },
    )
}

#[test]
fn test_task_stats() {
    let tasks = vec![
        task(TaskStatus::Todo),
        task(TaskStatus::InProgress),
        task(TaskStatus::Done),
    ];

    let stats = TaskStats::from_tasks(&tasks);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.todo, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.completion_rate, 33);

    let stats = TaskStats::from_tasks(&tasks[2..]);
    assert_eq!(stats.completion_rate, 100);

    let stats = TaskStats::from_tasks(&Vec::<Task>::new());
    assert_eq!(stats, TaskStats::default());
}

#[test]
fn test_task_stats_rounds_half_up() {
    let tasks = vec![
        task(TaskStatus::Done),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
        task(TaskStatus::Todo),
    ];
    // 1/8 = 12.5%
    assert_eq!(TaskStats::from_tasks(&tasks).completion_rate, 13);
}

#[test]
fn test_new_done_task_is_completed() {
    assert!(task(TaskStatus::Done).completed_at.is_some());
    assert!(task(TaskStatus::Todo).completed_at.is_none());
}

#[test]
fn test_task_update_tracks_completion() {
    let update = TaskUpdate::default().with_status(TaskStatus::Done);
    let body = serde_json::to_value(&update).unwrap();
    assert_eq!(body["status"], "done");
    assert!(body["completed_at"].is_string());

    let update = TaskUpdate::default().with_status(TaskStatus::Todo);
    let body = serde_json::to_value(&update).unwrap();
    assert_eq!(body["status"], "todo");
    assert!(body["completed_at"].is_null());
    assert!(body.get("title").is_none());
}

#[test]
fn test_notes_stats() {
    let mut notes = vec![
        note(NoteCategory::Work, true),
        note(NoteCategory::Work, false),
        note(NoteCategory::Ideas, true),
        note(NoteCategory::Other, false),
    ];
    let newest = notes[0].created_at + Duration::days(1);
    notes[3].created_at = newest;
    notes[3].updated_at = newest;

    let stats = NotesStats::from_notes(&notes);
    assert_eq!(stats.total_notes, 4);
    assert_eq!(stats.work_notes, 2);
    assert_eq!(stats.ideas_notes, 1);
    assert_eq!(stats.other_notes, 1);
    assert_eq!(stats.personal_notes, 0);
    assert_eq!(stats.favorite_notes, 2);
    assert_eq!(stats.last_note_created, Some(newest));
    assert_eq!(stats.last_note_updated, Some(newest));
}

#[test]
fn test_note_category_from_str() {
    assert_eq!("study".parse::<NoteCategory>().unwrap(), NoteCategory::Study);
    assert!("misc".parse::<NoteCategory>().is_err());
}

#[test]
fn test_project_default_color() {
    let project = Project::new(
        "user",
        NewProject {
            name: "Launch".to_string(),
            ..Default::default()
        },
    );
    assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
    assert!(project.description.is_none());
}
