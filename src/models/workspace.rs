#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

impl Project {
    pub fn new(user_id: impl Into<String>, project: NewProject) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: project.name,
            description: project.description,
            color: project
                .color
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub assignee: Option<String>,
}

impl Task {
    pub fn new(user_id: impl Into<String>, task: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            completed_at: (task.status == TaskStatus::Done).then_some(now),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            url: task.url,
            assignee: task.assignee,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial task update. `completed_at` follows the status: moving a task to
/// done stamps it, moving it anywhere else clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TaskUpdate {
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self.completed_at = Some((status == TaskStatus::Done).then(Utc::now));
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Work,
    Personal,
    Study,
    Ideas,
    #[default]
    Other,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 5] = [
        NoteCategory::Work,
        NoteCategory::Personal,
        NoteCategory::Study,
        NoteCategory::Ideas,
        NoteCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::Work => "work",
            NoteCategory::Personal => "personal",
            NoteCategory::Study => "study",
            NoteCategory::Ideas => "ideas",
            NoteCategory::Other => "other",
        }
    }

    /// Short description used when prompting for a note title.
    pub fn hint(&self) -> &'static str {
        match self {
            NoteCategory::Work => "work related",
            NoteCategory::Personal => "personal",
            NoteCategory::Study => "study related",
            NoteCategory::Ideas => "ideas and inspiration",
            NoteCategory::Other => "other content",
        }
    }
}

impl Display for NoteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| eyre::eyre!("unknown note category: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: NoteCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

impl Note {
    pub fn new(user_id: impl Into<String>, note: NewNote) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: note.title,
            content: note.content,
            category: note.category,
            tags: note.tags,
            is_favorite: note.is_favorite,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<NoteCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteQuery {
    pub query: Option<String>,
    pub category: Option<NoteCategory>,
    pub favorites_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    /// Percentage of done tasks, rounded to the nearest integer
    pub completion_rate: u32,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = TaskStats::default();
        for task in tasks {
            stats.total += 1;
            match task.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Done => stats.done += 1,
            }
        }
        if stats.total > 0 {
            stats.completion_rate =
                ((stats.done as f64 / stats.total as f64) * 100.0).round() as u32;
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotesStats {
    pub total_notes: usize,
    pub work_notes: usize,
    pub personal_notes: usize,
    pub study_notes: usize,
    pub ideas_notes: usize,
    pub other_notes: usize,
    pub favorite_notes: usize,
    pub last_note_created: Option<DateTime<Utc>>,
    pub last_note_updated: Option<DateTime<Utc>>,
}

impl NotesStats {
    pub fn from_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut stats = NotesStats::default();
        for note in notes {
            stats.total_notes += 1;
            match note.category {
                NoteCategory::Work => stats.work_notes += 1,
                NoteCategory::Personal => stats.personal_notes += 1,
                NoteCategory::Study => stats.study_notes += 1,
                NoteCategory::Ideas => stats.ideas_notes += 1,
                NoteCategory::Other => stats.other_notes += 1,
            }
            if note.is_favorite {
                stats.favorite_notes += 1;
            }
            stats.last_note_created = stats.last_note_created.max(Some(note.created_at));
            stats.last_note_updated = stats.last_note_updated.max(Some(note.updated_at));
        }
        stats
    }
}
