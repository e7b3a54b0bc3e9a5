#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    models::{Project, Task},
    repository::ArcWorkspaceRepository,
};

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("not a JSON document: {0}")]
    InvalidJson(String),

    #[error("`{0}` must be an array")]
    MissingArray(&'static str),

    #[error("invalid {kind} at index {index}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("task {task} refers to unknown project {project}")]
    UnknownProject { task: String, project: String },
}

/// Backup of every project and task, as written by `data export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceExport {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl WorkspaceExport {
    pub fn new(projects: Vec<Project>, tasks: Vec<Task>, export_date: DateTime<Utc>) -> Self {
        Self {
            projects,
            tasks,
            export_date,
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("encoding export")
    }

    /// Parses and validates an export file. `exportDate` and `version` are
    /// informative and may be missing; the record arrays may not.
    pub fn parse(raw: &str) -> Result<Self, ImportError> {
        let doc: Value =
            serde_json::from_str(raw).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

        let projects: Vec<Project> = records(&doc, "projects", "project")?;
        let tasks: Vec<Task> = records(&doc, "tasks", "task")?;

        let export_date = doc
            .get("exportDate")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_else(Utc::now);
        let version = doc
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(EXPORT_VERSION)
            .to_string();

        let export = Self {
            projects,
            tasks,
            export_date,
            version,
        };
        export.validate()?;
        Ok(export)
    }

    fn validate(&self) -> Result<(), ImportError> {
        let mut project_ids = HashSet::new();
        for p in &self.projects {
            if !project_ids.insert(p.id.as_str()) {
                return Err(ImportError::DuplicateId {
                    kind: "project",
                    id: p.id.clone(),
                });
            }
        }

        let mut task_ids = HashSet::new();
        for t in &self.tasks {
            if !task_ids.insert(t.id.as_str()) {
                return Err(ImportError::DuplicateId {
                    kind: "task",
                    id: t.id.clone(),
                });
            }
            match t.project_id.as_deref() {
                Some(project) if !project_ids.contains(project) => {
                    return Err(ImportError::UnknownProject {
                        task: t.id.clone(),
                        project: project.to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Hands every record to `user_id`, so a backup taken under another
    /// identity imports into the current one.
    pub fn assign_to(mut self, user_id: &str) -> Self {
        for p in &mut self.projects {
            p.user_id = user_id.to_string();
        }
        for t in &mut self.tasks {
            t.user_id = user_id.to_string();
        }
        self
    }
}

fn records<T: serde::de::DeserializeOwned>(
    doc: &Value,
    field: &'static str,
    kind: &'static str,
) -> Result<Vec<T>, ImportError> {
    let Some(items) = doc.get(field).and_then(Value::as_array) else {
        return Err(ImportError::MissingArray(field));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone()).map_err(|e| ImportError::InvalidRecord {
                kind,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Reads every project and task of the current user.
pub async fn export_workspace(repo: &ArcWorkspaceRepository) -> Result<WorkspaceExport> {
    let (projects, tasks) = tokio::try_join!(repo.list_projects(), repo.list_tasks(None))
        .wrap_err("reading workspace")?;
    Ok(WorkspaceExport::new(projects, tasks, Utc::now()))
}

/// Replaces every project and task of `user_id` with the ones in `export`.
pub async fn import_workspace(
    repo: &ArcWorkspaceRepository,
    export: WorkspaceExport,
    user_id: &str,
) -> Result<WorkspaceExport> {
    let export = export.assign_to(user_id);
    log::info!(
        "Importing {} projects and {} tasks",
        export.projects.len(),
        export.tasks.len()
    );
    repo.replace_projects_and_tasks(&export.projects, &export.tasks)
        .await
        .wrap_err("importing workspace")?;
    Ok(export)
}
